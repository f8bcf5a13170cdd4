//! Typed message protocol between the coordinator and workers.

pub mod envelope;
pub mod types;

pub use envelope::Envelope;
pub use types::{
    Acceptance, CapabilityCard, CustomerSignals, DesignConcept, Domain, DomainReport, LaunchPlan,
    MarketTrends, MessageKind, Milestone, PartnerNetwork, Payload, Proposal, RegulatoryOutlook,
    RfpRequest, TaskSpec, WorkerResult,
};
