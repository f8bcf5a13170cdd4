//! Design specialist: product concept and user journey.

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::{DataAccess, DesignAssets, FetchQuery, FetchRecord};
use crate::protocol::{
    CapabilityCard, DesignConcept, Domain, DomainReport, Proposal, RfpRequest, TaskSpec,
    WorkerResult,
};

use super::{supported_kinds, Specialist};

pub struct DesignWorker {
    data: Arc<dyn DataAccess>,
}

impl DesignWorker {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    fn fallback_assets() -> DesignAssets {
        DesignAssets {
            palette: "unstyled".to_string(),
            style: "unstyled".to_string(),
            components: Vec::new(),
        }
    }

    fn concept(task: &TaskSpec, assets: DesignAssets) -> DesignConcept {
        DesignConcept {
            style: assets.style,
            palette: assets.palette,
            journey: vec![
                format!("User discovers '{}'", task.product),
                "AI recommends sustainable options".to_string(),
                "User compares footprint & cost".to_string(),
                "Purchase & onboarding".to_string(),
            ],
        }
    }
}

#[async_trait]
impl Specialist for DesignWorker {
    fn domain(&self) -> Domain {
        Domain::Design
    }

    fn card(&self) -> CapabilityCard {
        CapabilityCard {
            worker_id: self.domain().as_str().to_string(),
            display_name: "Design Architect".to_string(),
            description: "Creates user journeys and design prototypes.".to_string(),
            capabilities: vec!["design_architecture".to_string()],
            supported: supported_kinds(),
        }
    }

    fn proposal(&self, _request: &RfpRequest) -> Proposal {
        Proposal {
            worker_id: self.domain().as_str().to_string(),
            capability: "design_architecture".to_string(),
            cost_units: 3,
            eta_days: 2,
        }
    }

    async fn execute(&self, task: &TaskSpec) -> WorkerResult {
        let (degraded, assets) = match self.data.fetch(FetchQuery::DesignAssets).await {
            Ok(FetchRecord::DesignAssets(assets)) => (false, assets),
            Ok(other) => {
                tracing::warn!("Design fetch returned mismatched record: {:?}", other);
                (true, Self::fallback_assets())
            }
            Err(e) => {
                tracing::warn!("Design fetch failed, degrading: {}", e);
                (true, Self::fallback_assets())
            }
        };

        WorkerResult {
            worker_id: self.domain().as_str().to_string(),
            domain: self.domain(),
            degraded,
            report: DomainReport::Design(Self::concept(task, assets)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::StaticDataAccess;

    #[tokio::test]
    async fn test_execute_reports_design_concept() {
        let worker = DesignWorker::new(Arc::new(StaticDataAccess::new()));
        let task = TaskSpec {
            region: "LATAM".to_string(),
            product: "Circular Supply Chain Solution".to_string(),
        };

        let result = worker.execute(&task).await;
        assert!(!result.degraded);
        let DomainReport::Design(concept) = result.report else {
            panic!("expected design report");
        };
        assert_eq!(concept.style, "modern");
        assert!(concept.journey[0].contains("Circular Supply Chain Solution"));
    }
}
