//! Launch-planning specialist: go-to-market rollout.

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::{DataAccess, FetchQuery, FetchRecord};
use crate::protocol::{
    CapabilityCard, Domain, DomainReport, LaunchPlan, Milestone, PartnerNetwork, Proposal,
    RfpRequest, TaskSpec, WorkerResult,
};

use super::{supported_kinds, Specialist};

pub struct LaunchWorker {
    data: Arc<dyn DataAccess>,
}

impl LaunchWorker {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    fn plan(task: &TaskSpec, partners: PartnerNetwork) -> LaunchPlan {
        let mut key_partners = partners.suppliers;
        key_partners.extend(partners.distributors);

        LaunchPlan {
            timeline: vec![
                Milestone {
                    phase: "Month 1".to_string(),
                    action: "Finalize partnerships and approvals".to_string(),
                },
                Milestone {
                    phase: "Month 2".to_string(),
                    action: "Pilot with key suppliers/distributors".to_string(),
                },
                Milestone {
                    phase: "Month 3".to_string(),
                    action: "Full campaign rollout".to_string(),
                },
            ],
            channels: vec![
                "Online".to_string(),
                "Retail".to_string(),
                "B2B partner marketing".to_string(),
            ],
            pitch_theme: format!("Opportunity in {}", task.region),
            key_partners,
        }
    }
}

#[async_trait]
impl Specialist for LaunchWorker {
    fn domain(&self) -> Domain {
        Domain::Launch
    }

    fn card(&self) -> CapabilityCard {
        CapabilityCard {
            worker_id: self.domain().as_str().to_string(),
            display_name: "Launch Planning".to_string(),
            description: "Builds go-to-market campaign plans and rollout timelines.".to_string(),
            capabilities: vec!["go_to_market".to_string()],
            supported: supported_kinds(),
        }
    }

    fn proposal(&self, _request: &RfpRequest) -> Proposal {
        Proposal {
            worker_id: self.domain().as_str().to_string(),
            capability: "go_to_market".to_string(),
            cost_units: 4,
            eta_days: 2,
        }
    }

    async fn execute(&self, task: &TaskSpec) -> WorkerResult {
        let query = FetchQuery::Partners {
            region: task.region.clone(),
        };
        // The rollout skeleton stands on its own; partner data only enriches
        // it, so a failed fetch degrades the plan instead of emptying it.
        let (degraded, partners) = match self.data.fetch(query).await {
            Ok(FetchRecord::Partners(partners)) => (false, partners),
            Ok(other) => {
                tracing::warn!("Launch fetch returned mismatched record: {:?}", other);
                (
                    true,
                    PartnerNetwork {
                        region: task.region.clone(),
                        suppliers: Vec::new(),
                        distributors: Vec::new(),
                    },
                )
            }
            Err(e) => {
                tracing::warn!("Launch fetch failed, degrading: {}", e);
                (
                    true,
                    PartnerNetwork {
                        region: task.region.clone(),
                        suppliers: Vec::new(),
                        distributors: Vec::new(),
                    },
                )
            }
        };

        WorkerResult {
            worker_id: self.domain().as_str().to_string(),
            domain: self.domain(),
            degraded,
            report: DomainReport::Launch(Self::plan(task, partners)),
        }
    }
}
