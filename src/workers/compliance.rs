//! Compliance and sustainability specialist.

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::{DataAccess, FetchQuery, FetchRecord};
use crate::protocol::{
    CapabilityCard, Domain, DomainReport, Proposal, RegulatoryOutlook, RfpRequest, TaskSpec,
    WorkerResult,
};

use super::{supported_kinds, Specialist};

pub struct ComplianceWorker {
    data: Arc<dyn DataAccess>,
}

impl ComplianceWorker {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    // Conservative defaults: without data, readiness is not assumed.
    fn fallback(region: &str) -> RegulatoryOutlook {
        RegulatoryOutlook {
            region: region.to_string(),
            regulatory_ready: false,
            esg_frameworks: Vec::new(),
            co2_intensity_cap: "unknown".to_string(),
        }
    }
}

#[async_trait]
impl Specialist for ComplianceWorker {
    fn domain(&self) -> Domain {
        Domain::Compliance
    }

    fn card(&self) -> CapabilityCard {
        CapabilityCard {
            worker_id: self.domain().as_str().to_string(),
            display_name: "Compliance & Sustainability".to_string(),
            description: "Checks regional regulations and ESG frameworks.".to_string(),
            capabilities: vec!["compliance_esg".to_string()],
            supported: supported_kinds(),
        }
    }

    fn proposal(&self, _request: &RfpRequest) -> Proposal {
        Proposal {
            worker_id: self.domain().as_str().to_string(),
            capability: "compliance_esg".to_string(),
            cost_units: 2,
            eta_days: 1,
        }
    }

    async fn execute(&self, task: &TaskSpec) -> WorkerResult {
        let query = FetchQuery::Regulations {
            region: task.region.clone(),
        };
        let (degraded, outlook) = match self.data.fetch(query).await {
            Ok(FetchRecord::Regulations(outlook)) => (false, outlook),
            Ok(other) => {
                tracing::warn!("Compliance fetch returned mismatched record: {:?}", other);
                (true, Self::fallback(&task.region))
            }
            Err(e) => {
                tracing::warn!("Compliance fetch failed, degrading: {}", e);
                (true, Self::fallback(&task.region))
            }
        };

        WorkerResult {
            worker_id: self.domain().as_str().to_string(),
            domain: self.domain(),
            degraded,
            report: DomainReport::Compliance(outlook),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{FailingDataAccess, StaticDataAccess};

    #[tokio::test]
    async fn test_execute_reports_regulations() {
        let worker = ComplianceWorker::new(Arc::new(StaticDataAccess::new()));
        let task = TaskSpec {
            region: "LATAM".to_string(),
            product: "Circular Supply Chain Solution".to_string(),
        };

        let result = worker.execute(&task).await;
        assert!(!result.degraded);
        assert!(matches!(result.report, DomainReport::Compliance(_)));
    }

    #[tokio::test]
    async fn test_degraded_outlook_is_conservative() {
        let worker = ComplianceWorker::new(Arc::new(FailingDataAccess));
        let task = TaskSpec {
            region: "LATAM".to_string(),
            product: "Circular Supply Chain Solution".to_string(),
        };

        let result = worker.execute(&task).await;
        assert!(result.degraded);
        let DomainReport::Compliance(outlook) = result.report else {
            panic!("expected compliance report");
        };
        assert!(!outlook.regulatory_ready);
    }
}
