//! Customer insight specialist: sentiment and top requests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::{DataAccess, FetchQuery, FetchRecord};
use crate::protocol::{
    CapabilityCard, CustomerSignals, Domain, DomainReport, Proposal, RfpRequest, TaskSpec,
    WorkerResult,
};

use super::{supported_kinds, Specialist};

pub struct CustomerWorker {
    data: Arc<dyn DataAccess>,
}

impl CustomerWorker {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    fn fallback(product: &str) -> CustomerSignals {
        CustomerSignals {
            product: product.to_string(),
            average_sentiment: "unknown".to_string(),
            top_requests: Vec::new(),
        }
    }
}

#[async_trait]
impl Specialist for CustomerWorker {
    fn domain(&self) -> Domain {
        Domain::Customer
    }

    fn card(&self) -> CapabilityCard {
        CapabilityCard {
            worker_id: self.domain().as_str().to_string(),
            display_name: "Customer Insight".to_string(),
            description: "Analyzes customer sentiment and top requests.".to_string(),
            capabilities: vec!["customer_insight".to_string()],
            supported: supported_kinds(),
        }
    }

    fn proposal(&self, _request: &RfpRequest) -> Proposal {
        Proposal {
            worker_id: self.domain().as_str().to_string(),
            capability: "customer_insight".to_string(),
            cost_units: 2,
            eta_days: 1,
        }
    }

    async fn execute(&self, task: &TaskSpec) -> WorkerResult {
        let query = FetchQuery::CustomerSignals {
            product: task.product.clone(),
        };
        let (degraded, signals) = match self.data.fetch(query).await {
            Ok(FetchRecord::CustomerSignals(signals)) => (false, signals),
            Ok(other) => {
                tracing::warn!("Customer fetch returned mismatched record: {:?}", other);
                (true, Self::fallback(&task.product))
            }
            Err(e) => {
                tracing::warn!("Customer fetch failed, degrading: {}", e);
                (true, Self::fallback(&task.product))
            }
        };

        WorkerResult {
            worker_id: self.domain().as_str().to_string(),
            domain: self.domain(),
            degraded,
            report: DomainReport::Customer(signals),
        }
    }
}
