//! The aggregated plan: one entry per engaged worker domain.

use serde::{Deserialize, Serialize};

use crate::protocol::{Domain, WorkerResult};

/// Outcome for one domain. Every engaged domain ends the run with exactly
/// one of these, never both, never neither.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanEntry {
    Delivered(WorkerResult),
    MissingResult { worker_id: String, reason: String },
}

impl PlanEntry {
    pub fn missing(worker_id: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanEntry::MissingResult {
            worker_id: worker_id.into(),
            reason: reason.into(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, PlanEntry::MissingResult { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PlanEntry::Delivered(result) if result.degraded)
    }
}

/// Composite run output, built incrementally during synthesis. One named
/// field per worker domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AggregatedPlan {
    pub region: String,
    pub product: String,
    pub market: Option<PlanEntry>,
    pub customer: Option<PlanEntry>,
    pub compliance: Option<PlanEntry>,
    pub partnership: Option<PlanEntry>,
    pub design: Option<PlanEntry>,
    pub launch: Option<PlanEntry>,
}

impl AggregatedPlan {
    pub fn new(region: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            product: product.into(),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, domain: Domain, entry: PlanEntry) {
        let slot = self.slot_mut(domain);
        if slot.is_some() {
            tracing::warn!("Plan entry for domain '{}' overwritten", domain);
        }
        *slot = Some(entry);
    }

    pub fn entry(&self, domain: Domain) -> Option<&PlanEntry> {
        match domain {
            Domain::Market => self.market.as_ref(),
            Domain::Customer => self.customer.as_ref(),
            Domain::Compliance => self.compliance.as_ref(),
            Domain::Partnership => self.partnership.as_ref(),
            Domain::Design => self.design.as_ref(),
            Domain::Launch => self.launch.as_ref(),
        }
    }

    fn slot_mut(&mut self, domain: Domain) -> &mut Option<PlanEntry> {
        match domain {
            Domain::Market => &mut self.market,
            Domain::Customer => &mut self.customer,
            Domain::Compliance => &mut self.compliance,
            Domain::Partnership => &mut self.partnership,
            Domain::Design => &mut self.design,
            Domain::Launch => &mut self.launch,
        }
    }

    /// Populated `(domain, entry)` pairs in stable domain order.
    pub fn entries(&self) -> Vec<(Domain, &PlanEntry)> {
        Domain::ALL
            .iter()
            .filter_map(|d| self.entry(*d).map(|e| (*d, e)))
            .collect()
    }

    /// Complete once every engaged domain holds an entry.
    pub fn is_complete(&self, engaged: &[Domain]) -> bool {
        engaged.iter().all(|d| self.entry(*d).is_some())
    }

    pub fn missing_domains(&self) -> Vec<Domain> {
        self.entries()
            .into_iter()
            .filter(|(_, e)| e.is_missing())
            .map(|(d, _)| d)
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.entries().iter().filter(|(_, e)| !e.is_missing()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DomainReport, MarketTrends};

    fn delivered_market() -> PlanEntry {
        PlanEntry::Delivered(WorkerResult {
            worker_id: "market".to_string(),
            domain: Domain::Market,
            degraded: false,
            report: DomainReport::Market(MarketTrends {
                region: "LATAM".to_string(),
                growth_rate: 1.1,
                competitors: Vec::new(),
                trends: Vec::new(),
            }),
        })
    }

    #[test]
    fn test_insert_and_completeness() {
        let mut plan = AggregatedPlan::new("LATAM", "Circular Supply Chain Solution");
        let engaged = [Domain::Market, Domain::Compliance];
        assert!(!plan.is_complete(&engaged));

        plan.insert(Domain::Market, delivered_market());
        plan.insert(
            Domain::Compliance,
            PlanEntry::missing("compliance", "no result within timeout"),
        );

        assert!(plan.is_complete(&engaged));
        assert_eq!(plan.entries().len(), 2);
        assert_eq!(plan.missing_domains(), vec![Domain::Compliance]);
        assert_eq!(plan.delivered_count(), 1);
    }

    #[test]
    fn test_entry_is_exclusive_per_domain() {
        let mut plan = AggregatedPlan::new("LATAM", "product");
        plan.insert(Domain::Market, delivered_market());

        let entry = plan.entry(Domain::Market).unwrap();
        assert!(!entry.is_missing());
        assert!(!entry.is_degraded());
        assert!(plan.entry(Domain::Design).is_none());
    }
}
