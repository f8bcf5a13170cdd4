//! Partnership specialist: supplier and distributor scouting.

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::{DataAccess, FetchQuery, FetchRecord};
use crate::protocol::{
    CapabilityCard, Domain, DomainReport, PartnerNetwork, Proposal, RfpRequest, TaskSpec,
    WorkerResult,
};

use super::{supported_kinds, Specialist};

pub struct PartnershipWorker {
    data: Arc<dyn DataAccess>,
}

impl PartnershipWorker {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    fn fallback(region: &str) -> PartnerNetwork {
        PartnerNetwork {
            region: region.to_string(),
            suppliers: Vec::new(),
            distributors: Vec::new(),
        }
    }
}

#[async_trait]
impl Specialist for PartnershipWorker {
    fn domain(&self) -> Domain {
        Domain::Partnership
    }

    fn card(&self) -> CapabilityCard {
        CapabilityCard {
            worker_id: self.domain().as_str().to_string(),
            display_name: "Partnership".to_string(),
            description: "Finds suppliers and distributors for partnerships.".to_string(),
            capabilities: vec!["partnerships".to_string()],
            supported: supported_kinds(),
        }
    }

    fn proposal(&self, _request: &RfpRequest) -> Proposal {
        Proposal {
            worker_id: self.domain().as_str().to_string(),
            capability: "partnerships".to_string(),
            cost_units: 3,
            eta_days: 2,
        }
    }

    async fn execute(&self, task: &TaskSpec) -> WorkerResult {
        let query = FetchQuery::Partners {
            region: task.region.clone(),
        };
        let (degraded, network) = match self.data.fetch(query).await {
            Ok(FetchRecord::Partners(network)) => (false, network),
            Ok(other) => {
                tracing::warn!("Partner fetch returned mismatched record: {:?}", other);
                (true, Self::fallback(&task.region))
            }
            Err(e) => {
                tracing::warn!("Partner fetch failed, degrading: {}", e);
                (true, Self::fallback(&task.region))
            }
        };

        WorkerResult {
            worker_id: self.domain().as_str().to_string(),
            domain: self.domain(),
            degraded,
            report: DomainReport::Partnership(network),
        }
    }
}
