//! The coordinator: drives discovery, negotiation, acceptance, tasking and
//! synthesis as strictly sequential phases over the message protocol.
//!
//! Within a phase, requests fan out to every live worker at once and the
//! responses fan back in through the conversation tracker; a phase is fully
//! resolved before the next begins. Per-worker failures never cross a phase
//! boundary as errors — they become exclusions or plan annotations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{RunInput, Settings, Timeouts};
use crate::conversation::Conversation;
use crate::datasource::{DataAccess, StaticDataAccess};
use crate::error::{Error, Result};
use crate::journal::{Journal, StatusLine};
use crate::plan::{AggregatedPlan, PlanEntry};
use crate::protocol::{
    Acceptance, CapabilityCard, Domain, Envelope, MessageKind, Payload, Proposal, RfpRequest,
    TaskSpec, WorkerResult,
};
use crate::registry::{Registry, WorkerHandle};
use crate::router::Router;
use crate::workers::{self, Specialist, WorkerContext};

/// Central orchestrator for one run.
pub struct Coordinator {
    router: Arc<Router>,
    registry: Arc<Registry>,
    convo: Arc<Conversation>,
    journal: Arc<Journal>,
    timeouts: Timeouts,
}

impl Coordinator {
    pub const ID: &'static str = "coordinator";

    /// Build the coordinator, register its inbox with the router and start
    /// the pump task that feeds responses into the conversation tracker.
    pub fn new(
        router: Arc<Router>,
        registry: Arc<Registry>,
        convo: Arc<Conversation>,
        journal: Arc<Journal>,
        timeouts: Timeouts,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        router.register(Self::ID, tx);
        tokio::spawn(pump(rx, convo.clone(), journal.clone()));

        Self {
            router,
            registry,
            convo,
            journal,
            timeouts,
        }
    }

    /// Execute the full protocol and synthesize the aggregated plan.
    ///
    /// The only fatal outcome is discovering zero workers; everything else a
    /// worker can do wrong ends as an exclusion or a `MissingResult` entry.
    pub async fn run(&self, input: &RunInput) -> Result<AggregatedPlan> {
        self.journal.record(
            Self::ID,
            format!(
                "Starting plan for product '{}' in region '{}'",
                input.product, input.region
            ),
        );

        let cards = self.discover().await?;
        let proposals = self.negotiate(&cards, input).await?;
        let accepted = self.accept_all(&proposals);
        let results = self.dispatch_tasks(&accepted, input).await?;
        let plan = self.synthesize(input, &accepted, results);

        self.journal.record(Self::ID, "Plan execution completed");
        Ok(plan)
    }

    /// Phase 1: request a capability card from every registered worker.
    async fn discover(&self) -> Result<Vec<CapabilityCard>> {
        let worker_ids = self.registry.worker_ids();
        if worker_ids.is_empty() {
            tracing::error!("No workers registered; aborting before any envelope is sent");
            return Err(Error::NoWorkersDiscovered);
        }

        let (pending, unreachable) =
            self.router
                .broadcast(Self::ID, &worker_ids, MessageKind::Discover, &Payload::Empty);
        for worker in &unreachable {
            self.journal.record(
                Self::ID,
                format!("Worker '{}' unreachable, excluded from run", worker),
            );
        }

        let responses = self
            .collect(pending, "discovery", self.timeouts.discover())
            .await?;

        let mut cards = Vec::new();
        for envelope in responses {
            match envelope.payload {
                Payload::Card(card) => {
                    self.journal.record(
                        Self::ID,
                        format!(
                            "Discovered '{}' ({})",
                            card.worker_id,
                            card.capabilities.join(", ")
                        ),
                    );
                    cards.push(card);
                }
                _ => {
                    tracing::warn!(
                        "Expected card from '{}', got {}; excluding",
                        envelope.sender,
                        envelope.kind
                    );
                }
            }
        }

        if cards.is_empty() {
            return Err(Error::NoWorkersDiscovered);
        }
        Ok(cards)
    }

    /// Phase 2: RFP fan-out, one proposal expected per discovered worker.
    async fn negotiate(&self, cards: &[CapabilityCard], input: &RunInput) -> Result<Vec<Proposal>> {
        let worker_ids: Vec<String> = cards.iter().map(|c| c.worker_id.clone()).collect();
        let rfp = Payload::Rfp(RfpRequest {
            region: input.region.clone(),
            product: input.product.clone(),
        });

        let (pending, unreachable) =
            self.router
                .broadcast(Self::ID, &worker_ids, MessageKind::Rfp, &rfp);
        for worker in &unreachable {
            self.journal.record(
                Self::ID,
                format!("Worker '{}' dropped before negotiation", worker),
            );
        }

        let responses = self
            .collect(pending, "negotiation", self.timeouts.proposal())
            .await?;

        let mut proposals = Vec::new();
        for envelope in responses {
            match envelope.payload {
                Payload::Propose(proposal) => {
                    self.journal.record(
                        Self::ID,
                        format!(
                            "Proposal from '{}': {} cost units, {} days",
                            proposal.worker_id, proposal.cost_units, proposal.eta_days
                        ),
                    );
                    proposals.push(proposal);
                }
                _ => {
                    self.journal.record(
                        Self::ID,
                        format!(
                            "Worker '{}' answered the RFP with {}, dropped from run",
                            envelope.sender, envelope.kind
                        ),
                    );
                }
            }
        }
        Ok(proposals)
    }

    /// Phase 3: accept every retained proposal.
    ///
    /// Accept-all is the selection policy, not a gap: each worker covers a
    /// disjoint domain, so there is nothing to bid between. No reply is
    /// awaited; the worker just moves to its acknowledged state.
    fn accept_all(&self, proposals: &[Proposal]) -> Vec<Proposal> {
        let mut accepted = Vec::new();
        for proposal in proposals {
            let envelope = Envelope::new(
                Self::ID,
                proposal.worker_id.clone(),
                MessageKind::Accept,
                Payload::Accept(Acceptance {
                    worker_id: proposal.worker_id.clone(),
                    capability: proposal.capability.clone(),
                }),
            );
            match self.router.send(envelope) {
                Ok(()) => {
                    self.journal.record(
                        Self::ID,
                        format!("Accepted proposal from '{}'", proposal.worker_id),
                    );
                    accepted.push(proposal.clone());
                }
                Err(e) => {
                    tracing::warn!("Could not accept '{}': {}", proposal.worker_id, e);
                    self.journal.record(
                        Self::ID,
                        format!("Worker '{}' dropped at acceptance", proposal.worker_id),
                    );
                }
            }
        }
        accepted
    }

    /// Phase 4: one task per accepted worker, results collected with the
    /// generous timeout.
    async fn dispatch_tasks(
        &self,
        accepted: &[Proposal],
        input: &RunInput,
    ) -> Result<HashMap<String, WorkerResult>> {
        let worker_ids: Vec<String> = accepted.iter().map(|p| p.worker_id.clone()).collect();
        let task = Payload::Task(TaskSpec {
            region: input.region.clone(),
            product: input.product.clone(),
        });

        let (pending, unreachable) =
            self.router
                .broadcast(Self::ID, &worker_ids, MessageKind::Task, &task);
        for worker in &unreachable {
            self.journal
                .record(Self::ID, format!("Worker '{}' could not be tasked", worker));
        }

        let responses = self
            .collect(pending, "tasking", self.timeouts.result())
            .await?;

        let mut results = HashMap::new();
        for envelope in responses {
            match envelope.payload {
                Payload::Result(result) => {
                    let status = if result.degraded { " (degraded)" } else { "" };
                    self.journal.record(
                        Self::ID,
                        format!("Result from '{}'{}", result.worker_id, status),
                    );
                    results.insert(result.worker_id.clone(), result);
                }
                _ => {
                    tracing::warn!(
                        "Worker '{}' answered its task with {}",
                        envelope.sender,
                        envelope.kind
                    );
                }
            }
        }
        Ok(results)
    }

    /// Phase 5: merge results into the plan, one entry per engaged domain.
    fn synthesize(
        &self,
        input: &RunInput,
        accepted: &[Proposal],
        mut results: HashMap<String, WorkerResult>,
    ) -> AggregatedPlan {
        let mut plan = AggregatedPlan::new(&input.region, &input.product);

        for proposal in accepted {
            let Some(domain) = Domain::parse(&proposal.worker_id) else {
                tracing::warn!("No plan slot for worker '{}'", proposal.worker_id);
                continue;
            };
            let entry = match results.remove(&proposal.worker_id) {
                Some(result) => PlanEntry::Delivered(result),
                None => {
                    PlanEntry::missing(proposal.worker_id.clone(), "no result within timeout")
                }
            };
            plan.insert(domain, entry);
        }

        plan
    }

    /// Fan-in: await every outstanding correlation id until all resolve or
    /// the phase deadline passes. Timed-out ids are abandoned so a late
    /// reply is discarded instead of leaking into a later phase.
    async fn collect(
        &self,
        pending: Vec<(String, String)>,
        phase: &str,
        timeout: Duration,
    ) -> Result<Vec<Envelope>> {
        let deadline = Instant::now() + timeout;
        let mut outstanding: HashMap<String, String> =
            pending.into_iter().map(|(worker, corr)| (corr, worker)).collect();
        let mut responses = Vec::new();

        while !outstanding.is_empty() {
            let keys: Vec<String> = outstanding.keys().cloned().collect();
            let remaining = deadline.saturating_duration_since(Instant::now());

            match self.convo.await_any(&keys, remaining).await {
                Ok((key, envelope)) => {
                    outstanding.remove(&key);
                    responses.push(envelope);
                }
                Err(Error::Timeout { .. }) => {
                    for (corr, worker) in &outstanding {
                        self.convo.abandon(corr);
                        tracing::warn!("Worker '{}' timed out during {}", worker, phase);
                        self.journal.record(
                            Self::ID,
                            format!("Worker '{}' timed out during {}", worker, phase),
                        );
                    }
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(responses)
    }
}

/// Feed the coordinator's inbox into the conversation tracker; journal any
/// informational traffic on the way through.
async fn pump(
    mut inbox: mpsc::UnboundedReceiver<Envelope>,
    convo: Arc<Conversation>,
    journal: Arc<Journal>,
) {
    while let Some(envelope) = inbox.recv().await {
        if let Payload::Info { message } = &envelope.payload {
            journal.record(&envelope.sender, message.clone());
        }
        if envelope.correlation_id.is_some() {
            convo.resolve(envelope);
        } else {
            tracing::debug!(
                "Coordinator ignoring uncorrelated {} from '{}'",
                envelope.kind,
                envelope.sender
            );
        }
    }
}

/// Everything a run produces: the plan plus the introspection surfaces.
#[derive(Debug)]
pub struct RunOutcome {
    pub plan: AggregatedPlan,
    pub journal: Vec<StatusLine>,
    pub audit_log: Vec<Envelope>,
}

/// Run the full specialist roster against the deterministic data source.
pub async fn execute_run(input: &RunInput, settings: &Settings) -> Result<RunOutcome> {
    let data: Arc<dyn DataAccess> = Arc::new(StaticDataAccess::new());
    execute_run_with(workers::default_specialists(data), input, settings).await
}

/// Run an explicit specialist roster. All protocol state is constructed
/// fresh here and torn down with the run.
pub async fn execute_run_with(
    specialists: Vec<Arc<dyn Specialist>>,
    input: &RunInput,
    settings: &Settings,
) -> Result<RunOutcome> {
    input.validate()?;

    let router = Arc::new(Router::new());
    let registry = Arc::new(Registry::new());
    let convo = Arc::new(Conversation::new());
    let journal = Arc::new(Journal::new());

    for specialist in specialists {
        let card = specialist.card();
        let (tx, rx) = mpsc::unbounded_channel();
        router.register(card.worker_id.clone(), tx);
        registry.register(WorkerHandle::new(
            card.worker_id.clone(),
            card.display_name.clone(),
        ));
        let ctx = WorkerContext {
            worker_id: card.worker_id.clone(),
            router: router.clone(),
            journal: journal.clone(),
        };
        workers::spawn_worker(specialist, ctx, rx);
    }

    let coordinator = Coordinator::new(
        router.clone(),
        registry,
        convo,
        journal.clone(),
        settings.timeouts.clone(),
    );
    let plan = coordinator.run(input).await?;

    Ok(RunOutcome {
        plan,
        journal: journal.snapshot(),
        audit_log: router.audit_log(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::FailingDataAccess;
    use crate::workers::{
        ComplianceWorker, CustomerWorker, DesignWorker, LaunchWorker, MarketWorker,
        PartnershipWorker,
    };

    fn latam_input() -> RunInput {
        RunInput::new("LATAM", "Circular Supply Chain Solution")
    }

    fn fast_settings() -> Settings {
        Settings {
            timeouts: Timeouts {
                discover_ms: 500,
                proposal_ms: 300,
                result_ms: 2_000,
            },
        }
    }

    #[tokio::test]
    async fn test_healthy_run_fills_every_domain() {
        let outcome = execute_run(&latam_input(), &fast_settings()).await.unwrap();

        let plan = &outcome.plan;
        assert_eq!(plan.region, "LATAM");
        assert_eq!(plan.entries().len(), 6);
        assert_eq!(plan.delivered_count(), 6);
        assert!(plan.missing_domains().is_empty());
        assert!(plan.is_complete(&Domain::ALL));
        for (_, entry) in plan.entries() {
            assert!(!entry.is_degraded());
        }
    }

    #[tokio::test]
    async fn test_request_response_round_trip() {
        let outcome = execute_run(&latam_input(), &fast_settings()).await.unwrap();

        // Every request kind that expects an answer got one, correlated to
        // the request's own id.
        for request in &outcome.audit_log {
            let expects_reply = matches!(
                request.kind,
                MessageKind::Discover | MessageKind::Rfp | MessageKind::Task
            );
            if !expects_reply {
                continue;
            }
            assert!(
                outcome.audit_log.iter().any(|e| e.answers(&request.id)),
                "no response correlated to {} request {}",
                request.kind,
                request.id
            );
        }
    }

    #[tokio::test]
    async fn test_failing_compliance_source_degrades_but_completes() {
        let healthy: Arc<dyn DataAccess> = Arc::new(StaticDataAccess::new());
        let specialists: Vec<Arc<dyn Specialist>> = vec![
            Arc::new(MarketWorker::new(healthy.clone())),
            Arc::new(CustomerWorker::new(healthy.clone())),
            Arc::new(ComplianceWorker::new(Arc::new(FailingDataAccess))),
            Arc::new(PartnershipWorker::new(healthy.clone())),
            Arc::new(DesignWorker::new(healthy.clone())),
            Arc::new(LaunchWorker::new(healthy)),
        ];

        let outcome = execute_run_with(specialists, &latam_input(), &fast_settings())
            .await
            .unwrap();

        let plan = &outcome.plan;
        assert_eq!(plan.entries().len(), 6);
        assert!(plan.missing_domains().is_empty());
        assert!(plan.entry(Domain::Compliance).unwrap().is_degraded());
        assert!(!plan.entry(Domain::Market).unwrap().is_degraded());
    }

    #[tokio::test]
    async fn test_zero_workers_aborts_before_any_envelope() {
        let router = Arc::new(Router::new());
        let registry = Arc::new(Registry::new());
        let convo = Arc::new(Conversation::new());
        let journal = Arc::new(Journal::new());
        let coordinator = Coordinator::new(
            router.clone(),
            registry,
            convo,
            journal,
            Timeouts::default(),
        );

        let err = coordinator.run(&latam_input()).await.unwrap_err();
        assert!(matches!(err, Error::NoWorkersDiscovered));
        assert!(router.audit_log().is_empty());
    }

    #[tokio::test]
    async fn test_silent_negotiator_is_excluded_but_run_completes() {
        let router = Arc::new(Router::new());
        let registry = Arc::new(Registry::new());
        let convo = Arc::new(Conversation::new());
        let journal = Arc::new(Journal::new());
        let healthy: Arc<dyn DataAccess> = Arc::new(StaticDataAccess::new());

        // A real market worker.
        let market: Arc<dyn Specialist> = Arc::new(MarketWorker::new(healthy.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        router.register("market", tx);
        registry.register(WorkerHandle::new("market", "Market Insight"));
        workers::spawn_worker(
            market,
            WorkerContext {
                worker_id: "market".to_string(),
                router: router.clone(),
                journal: journal.clone(),
            },
            rx,
        );

        // A compliance worker that answers discovery but never the RFP.
        let silent_card = ComplianceWorker::new(healthy).card();
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        router.register("compliance", tx);
        registry.register(WorkerHandle::new("compliance", "Compliance"));
        {
            let router = router.clone();
            tokio::spawn(async move {
                while let Some(envelope) = rx.recv().await {
                    if envelope.kind == MessageKind::Discover {
                        let reply = envelope
                            .reply(MessageKind::Card, Payload::Card(silent_card.clone()));
                        let _ = router.send(reply);
                    }
                }
            });
        }

        let coordinator = Coordinator::new(
            router.clone(),
            registry,
            convo,
            journal,
            fast_settings().timeouts,
        );
        let plan = coordinator.run(&latam_input()).await.unwrap();

        assert!(!plan.entry(Domain::Market).unwrap().is_missing());
        // Dropped during negotiation: never accepted, so no plan entry at all.
        assert!(plan.entry(Domain::Compliance).is_none());

        // And no ACCEPT or TASK ever went its way.
        let to_compliance_after_rfp: Vec<MessageKind> = router
            .audit_log()
            .iter()
            .filter(|e| e.recipient == "compliance")
            .map(|e| e.kind)
            .filter(|k| matches!(k, MessageKind::Accept | MessageKind::Task))
            .collect();
        assert!(to_compliance_after_rfp.is_empty());
    }

    #[tokio::test]
    async fn test_task_timeout_yields_missing_result() {
        let router = Arc::new(Router::new());
        let registry = Arc::new(Registry::new());
        let convo = Arc::new(Conversation::new());
        let journal = Arc::new(Journal::new());
        let healthy: Arc<dyn DataAccess> = Arc::new(StaticDataAccess::new());

        // A real market worker.
        let market: Arc<dyn Specialist> = Arc::new(MarketWorker::new(healthy.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        router.register("market", tx);
        registry.register(WorkerHandle::new("market", "Market Insight"));
        workers::spawn_worker(
            market,
            WorkerContext {
                worker_id: "market".to_string(),
                router: router.clone(),
                journal: journal.clone(),
            },
            rx,
        );

        // A compliance worker that negotiates normally but never delivers
        // its task result.
        let stalled = ComplianceWorker::new(healthy);
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        router.register("compliance", tx);
        registry.register(WorkerHandle::new("compliance", "Compliance"));
        {
            let router = router.clone();
            tokio::spawn(async move {
                while let Some(envelope) = rx.recv().await {
                    let reply = match (&envelope.kind, &envelope.payload) {
                        (MessageKind::Discover, _) => {
                            envelope.reply(MessageKind::Card, Payload::Card(stalled.card()))
                        }
                        (MessageKind::Rfp, Payload::Rfp(request)) => envelope.reply(
                            MessageKind::Propose,
                            Payload::Propose(stalled.proposal(request)),
                        ),
                        _ => continue,
                    };
                    let _ = router.send(reply);
                }
            });
        }

        let timeouts = Timeouts {
            discover_ms: 500,
            proposal_ms: 300,
            result_ms: 500,
        };
        let coordinator = Coordinator::new(router, registry, convo, journal.clone(), timeouts);
        let plan = coordinator.run(&latam_input()).await.unwrap();

        // Accepted but silent on the task: the plan still carries an entry
        // for the domain, recorded as missing rather than dropped.
        assert_eq!(plan.entries().len(), 2);
        assert!(!plan.entry(Domain::Market).unwrap().is_missing());
        assert!(plan.entry(Domain::Compliance).unwrap().is_missing());
        assert_eq!(plan.missing_domains(), vec![Domain::Compliance]);
        assert!(journal
            .snapshot()
            .iter()
            .any(|l| l.message.contains("timed out during tasking")));
    }

    #[tokio::test]
    async fn test_unreachable_worker_does_not_crash_run() {
        let router = Arc::new(Router::new());
        let registry = Arc::new(Registry::new());
        let convo = Arc::new(Conversation::new());
        let journal = Arc::new(Journal::new());
        let healthy: Arc<dyn DataAccess> = Arc::new(StaticDataAccess::new());

        let market: Arc<dyn Specialist> = Arc::new(MarketWorker::new(healthy));
        let (tx, rx) = mpsc::unbounded_channel();
        router.register("market", tx);
        registry.register(WorkerHandle::new("market", "Market Insight"));
        workers::spawn_worker(
            market,
            WorkerContext {
                worker_id: "market".to_string(),
                router: router.clone(),
                journal: journal.clone(),
            },
            rx,
        );

        // Registered but owns no inbox: discovery reports it unreachable.
        registry.register(WorkerHandle::new("ghost", "Ghost"));

        let coordinator = Coordinator::new(
            router.clone(),
            registry,
            convo,
            journal.clone(),
            fast_settings().timeouts,
        );
        let plan = coordinator.run(&latam_input()).await.unwrap();

        assert!(!plan.entry(Domain::Market).unwrap().is_missing());
        assert!(journal
            .snapshot()
            .iter()
            .any(|l| l.message.contains("'ghost' unreachable")));
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_run() {
        let err = execute_run(&RunInput::new("", ""), &fast_settings())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
