//! Message kinds and payloads for the coordination protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message kind classification.
///
/// The full intent set of the wire protocol. Workers advertise the subset
/// they handle in their capability card; anything else gets the lenient
/// unhandled-notice reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Request a capability card
    Discover,
    /// Response carrying a capability card
    Card,
    /// Request for proposal
    Rfp,
    /// Proposal returned by a worker
    Propose,
    /// Accept a proposal
    Accept,
    /// Reject a proposal
    Reject,
    /// Task assignment
    Task,
    /// Task result
    Result,
    /// Informational message or status update
    Info,
    /// Error report
    Error,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Discover => "discover",
            MessageKind::Card => "card",
            MessageKind::Rfp => "rfp",
            MessageKind::Propose => "propose",
            MessageKind::Accept => "accept",
            MessageKind::Reject => "reject",
            MessageKind::Task => "task",
            MessageKind::Result => "result",
            MessageKind::Info => "info",
            MessageKind::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Worker domain. One specialist per domain, one plan entry per domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Market,
    Customer,
    Compliance,
    Partnership,
    Design,
    Launch,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Market,
        Domain::Customer,
        Domain::Compliance,
        Domain::Partnership,
        Domain::Design,
        Domain::Launch,
    ];

    /// Stable string name, also used as the worker id for that domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Market => "market",
            Domain::Customer => "customer",
            Domain::Compliance => "compliance",
            Domain::Partnership => "partnership",
            Domain::Design => "design",
            Domain::Launch => "launch",
        }
    }

    pub fn parse(s: &str) -> Option<Domain> {
        Domain::ALL.iter().copied().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A worker's self-description, produced once and returned verbatim on discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityCard {
    pub worker_id: String,
    pub display_name: String,
    pub description: String,
    /// Advertised capability tags.
    pub capabilities: Vec<String>,
    /// Message kinds this worker handles.
    pub supported: Vec<MessageKind>,
}

impl CapabilityCard {
    pub fn supports(&self, kind: MessageKind) -> bool {
        self.supported.contains(&kind)
    }
}

/// Shared run context sent with an RFP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RfpRequest {
    pub region: String,
    pub product: String,
}

/// A worker's answer to an RFP. Ephemeral; lives only within a negotiation round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Proposal {
    pub worker_id: String,
    pub capability: String,
    pub cost_units: u32,
    pub eta_days: u32,
}

/// Acceptance of a proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Acceptance {
    pub worker_id: String,
    pub capability: String,
}

/// Task parameters: the run's shared context, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSpec {
    pub region: String,
    pub product: String,
}

/// Market trends and competitor intelligence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketTrends {
    pub region: String,
    pub growth_rate: f64,
    pub competitors: Vec<String>,
    pub trends: Vec<String>,
}

/// Customer sentiment and top requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSignals {
    pub product: String,
    pub average_sentiment: String,
    pub top_requests: Vec<String>,
}

/// Regional regulatory and ESG readiness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegulatoryOutlook {
    pub region: String,
    pub regulatory_ready: bool,
    pub esg_frameworks: Vec<String>,
    pub co2_intensity_cap: String,
}

/// Supplier and distributor candidates for a region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerNetwork {
    pub region: String,
    pub suppliers: Vec<String>,
    pub distributors: Vec<String>,
}

/// Product concept: style, palette and user journey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignConcept {
    pub style: String,
    pub palette: String,
    pub journey: Vec<String>,
}

/// A launch-plan milestone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub phase: String,
    pub action: String,
}

/// Go-to-market rollout plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaunchPlan {
    pub timeline: Vec<Milestone>,
    pub channels: Vec<String>,
    pub pitch_theme: String,
    pub key_partners: Vec<String>,
}

/// Domain-specific task output, one variant per worker domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DomainReport {
    Market(MarketTrends),
    Customer(CustomerSignals),
    Compliance(RegulatoryOutlook),
    Partnership(PartnerNetwork),
    Design(DesignConcept),
    Launch(LaunchPlan),
}

impl DomainReport {
    pub fn domain(&self) -> Domain {
        match self {
            DomainReport::Market(_) => Domain::Market,
            DomainReport::Customer(_) => Domain::Customer,
            DomainReport::Compliance(_) => Domain::Compliance,
            DomainReport::Partnership(_) => Domain::Partnership,
            DomainReport::Design(_) => Domain::Design,
            DomainReport::Launch(_) => Domain::Launch,
        }
    }
}

/// Terminal artifact of a task. Immutable once produced.
///
/// `degraded` marks output assembled from fallback data after a data-access
/// failure; a degraded result still completes the task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerResult {
    pub worker_id: String,
    pub domain: Domain,
    pub degraded: bool,
    pub report: DomainReport,
}

/// Kind-dependent envelope payload.
///
/// Closed enum so dispatch is exhaustive matching, never string comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Empty,
    Card(CapabilityCard),
    Rfp(RfpRequest),
    Propose(Proposal),
    Accept(Acceptance),
    Task(TaskSpec),
    Result(WorkerResult),
    Info { message: String },
}

impl Payload {
    pub fn info(message: impl Into<String>) -> Self {
        Payload::Info {
            message: message.into(),
        }
    }
}
