//! Specialist workers and the shared message-handling driver.
//!
//! Every worker is a [`Specialist`] behind the same driver loop: the
//! specialist supplies the capability card, the proposal figures and the
//! task transform; the driver owns the inbox, the per-kind dispatch and the
//! lenient handling of anything outside the advertised capability set.

pub mod compliance;
pub mod customer;
pub mod design;
pub mod launch;
pub mod market;
pub mod partnership;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::datasource::DataAccess;
use crate::journal::Journal;
use crate::protocol::{
    CapabilityCard, Domain, Envelope, MessageKind, Payload, Proposal, RfpRequest, TaskSpec,
    WorkerResult,
};
use crate::router::Router;

pub use compliance::ComplianceWorker;
pub use customer::CustomerWorker;
pub use design::DesignWorker;
pub use launch::LaunchWorker;
pub use market::MarketWorker;
pub use partnership::PartnershipWorker;

/// Message kinds every specialist handles.
pub fn supported_kinds() -> Vec<MessageKind> {
    vec![
        MessageKind::Discover,
        MessageKind::Rfp,
        MessageKind::Accept,
        MessageKind::Task,
    ]
}

/// The polymorphic seam between the protocol driver and a worker's domain
/// logic. Concrete specialists differ only in their card, their proposal
/// figures and the shape of the report `execute` produces.
#[async_trait]
pub trait Specialist: Send + Sync + 'static {
    fn domain(&self) -> Domain;

    /// Immutable self-description, returned verbatim on discovery.
    fn card(&self) -> CapabilityCard;

    /// Cost/ETA answer to an RFP.
    fn proposal(&self, request: &RfpRequest) -> Proposal;

    /// Run the task: fetch external context and transform it into the
    /// domain report. A data-access failure degrades the result, it never
    /// fails the task.
    async fn execute(&self, task: &TaskSpec) -> WorkerResult;
}

/// Everything a running worker needs to talk to the rest of the run.
#[derive(Clone)]
pub struct WorkerContext {
    pub worker_id: String,
    pub router: Arc<Router>,
    pub journal: Arc<Journal>,
}

/// Spawn the inbox loop for a specialist. The loop ends when the inbox
/// closes, i.e. when the run's router is dropped.
pub fn spawn_worker(
    specialist: Arc<dyn Specialist>,
    ctx: WorkerContext,
    mut inbox: mpsc::UnboundedReceiver<Envelope>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut acknowledged = false;
        while let Some(envelope) = inbox.recv().await {
            handle_envelope(specialist.as_ref(), &ctx, &mut acknowledged, envelope).await;
        }
        tracing::debug!("Worker '{}' inbox closed, stopping", ctx.worker_id);
    })
}

async fn handle_envelope(
    specialist: &dyn Specialist,
    ctx: &WorkerContext,
    acknowledged: &mut bool,
    envelope: Envelope,
) {
    let card = specialist.card();

    if !card.supports(envelope.kind) {
        // Lenient-ignore policy: an unexpected kind gets a notice, never an
        // error that would take the worker out of the run.
        ctx.journal.record(
            &ctx.worker_id,
            format!("Ignoring unsupported {} message from '{}'", envelope.kind, envelope.sender),
        );
        let notice = envelope.reply(
            MessageKind::Info,
            Payload::info(format!("'{}' does not handle {}", ctx.worker_id, envelope.kind)),
        );
        send_reply(ctx, notice);
        return;
    }

    match envelope.kind {
        MessageKind::Discover => {
            ctx.journal
                .record(&ctx.worker_id, "Answering discovery with capability card");
            let reply = envelope.reply(MessageKind::Card, Payload::Card(card));
            send_reply(ctx, reply);
        }
        MessageKind::Rfp => {
            let Payload::Rfp(request) = &envelope.payload else {
                send_malformed_notice(ctx, &envelope);
                return;
            };
            let proposal = specialist.proposal(request);
            ctx.journal.record(
                &ctx.worker_id,
                format!(
                    "Proposing {} ({} cost units, {} days)",
                    proposal.capability, proposal.cost_units, proposal.eta_days
                ),
            );
            let reply = envelope.reply(MessageKind::Propose, Payload::Propose(proposal));
            send_reply(ctx, reply);
        }
        MessageKind::Accept => {
            // ACKNOWLEDGED: the engagement is booked, the task comes later.
            *acknowledged = true;
            ctx.journal
                .record(&ctx.worker_id, "Engagement accepted, awaiting task");
        }
        MessageKind::Task => {
            let Payload::Task(task) = &envelope.payload else {
                send_malformed_notice(ctx, &envelope);
                return;
            };
            if !*acknowledged {
                tracing::debug!("Worker '{}' tasked without prior accept", ctx.worker_id);
            }
            ctx.journal.record(
                &ctx.worker_id,
                format!("Executing task for region '{}'", task.region),
            );
            let result = specialist.execute(task).await;
            let status = if result.degraded {
                "Task finished with degraded data"
            } else {
                "Task finished"
            };
            ctx.journal.record(&ctx.worker_id, status);
            let reply = envelope.reply(MessageKind::Result, Payload::Result(result));
            send_reply(ctx, reply);
        }
        // Kinds outside the supported set were already answered above.
        _ => {}
    }
}

fn send_malformed_notice(ctx: &WorkerContext, envelope: &Envelope) {
    tracing::warn!(
        "Worker '{}' got {} with mismatched payload from '{}'",
        ctx.worker_id,
        envelope.kind,
        envelope.sender
    );
    let notice = envelope.reply(
        MessageKind::Info,
        Payload::info(format!("malformed payload for {}", envelope.kind)),
    );
    send_reply(ctx, notice);
}

fn send_reply(ctx: &WorkerContext, reply: Envelope) {
    if let Err(e) = ctx.router.send(reply) {
        tracing::warn!("Worker '{}' could not deliver reply: {}", ctx.worker_id, e);
    }
}

/// The full specialist roster, every worker wired to the same data source.
pub fn default_specialists(data: Arc<dyn DataAccess>) -> Vec<Arc<dyn Specialist>> {
    vec![
        Arc::new(MarketWorker::new(data.clone())),
        Arc::new(CustomerWorker::new(data.clone())),
        Arc::new(ComplianceWorker::new(data.clone())),
        Arc::new(PartnershipWorker::new(data.clone())),
        Arc::new(DesignWorker::new(data.clone())),
        Arc::new(LaunchWorker::new(data)),
    ]
}
