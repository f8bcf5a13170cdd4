//! Market insight specialist: trends and competitor intelligence.

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::{DataAccess, FetchQuery, FetchRecord};
use crate::protocol::{
    CapabilityCard, Domain, DomainReport, MarketTrends, Proposal, RfpRequest, TaskSpec,
    WorkerResult,
};

use super::{supported_kinds, Specialist};

pub struct MarketWorker {
    data: Arc<dyn DataAccess>,
}

impl MarketWorker {
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    fn fallback(region: &str) -> MarketTrends {
        MarketTrends {
            region: region.to_string(),
            growth_rate: 1.0,
            competitors: Vec::new(),
            trends: Vec::new(),
        }
    }
}

#[async_trait]
impl Specialist for MarketWorker {
    fn domain(&self) -> Domain {
        Domain::Market
    }

    fn card(&self) -> CapabilityCard {
        CapabilityCard {
            worker_id: self.domain().as_str().to_string(),
            display_name: "Market Insight".to_string(),
            description: "Collects market trends and competitor intelligence.".to_string(),
            capabilities: vec!["market_insight".to_string()],
            supported: supported_kinds(),
        }
    }

    fn proposal(&self, _request: &RfpRequest) -> Proposal {
        Proposal {
            worker_id: self.domain().as_str().to_string(),
            capability: "market_insight".to_string(),
            cost_units: 2,
            eta_days: 1,
        }
    }

    async fn execute(&self, task: &TaskSpec) -> WorkerResult {
        let query = FetchQuery::MarketTrends {
            region: task.region.clone(),
        };
        let (degraded, trends) = match self.data.fetch(query).await {
            Ok(FetchRecord::MarketTrends(trends)) => (false, trends),
            Ok(other) => {
                tracing::warn!("Market fetch returned mismatched record: {:?}", other);
                (true, Self::fallback(&task.region))
            }
            Err(e) => {
                tracing::warn!("Market fetch failed, degrading: {}", e);
                (true, Self::fallback(&task.region))
            }
        };

        WorkerResult {
            worker_id: self.domain().as_str().to_string(),
            domain: self.domain(),
            degraded,
            report: DomainReport::Market(trends),
        }
    }
}
