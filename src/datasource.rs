//! Pluggable data access for worker context fetching.
//!
//! Stands in for an external context-retrieval client. Workers call through
//! the [`DataAccess`] trait and never see a panic across the seam; every
//! failure surfaces as a typed [`DataAccessError`] they can degrade from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{CustomerSignals, MarketTrends, PartnerNetwork, RegulatoryOutlook};

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Data source not available: {0}")]
    NotAvailable(String),

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("{0}")]
    Other(String),
}

impl DataAccessError {
    pub fn other(s: impl Into<String>) -> Self {
        DataAccessError::Other(s.into())
    }
}

pub type FetchResult<T> = std::result::Result<T, DataAccessError>;

/// A context-fetch request, one variant per record the workers consume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum FetchQuery {
    MarketTrends { region: String },
    CustomerSignals { product: String },
    Regulations { region: String },
    Partners { region: String },
    DesignAssets,
}

/// Raw design assets prior to the design worker's transform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignAssets {
    pub palette: String,
    pub style: String,
    pub components: Vec<String>,
}

/// A structured record returned by the data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum FetchRecord {
    MarketTrends(MarketTrends),
    CustomerSignals(CustomerSignals),
    Regulations(RegulatoryOutlook),
    Partners(PartnerNetwork),
    DesignAssets(DesignAssets),
}

/// Function-like dependency from structured query to structured record.
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn fetch(&self, query: FetchQuery) -> FetchResult<FetchRecord>;
}

/// Deterministic in-process data source.
///
/// Record content is derived from a stable hash of the query inputs, so the
/// same query always yields the same record without any RNG state.
#[derive(Debug, Default)]
pub struct StaticDataAccess;

impl StaticDataAccess {
    pub fn new() -> Self {
        Self
    }

    fn market_trends(&self, region: &str) -> MarketTrends {
        let seed = stable_seed(region);
        MarketTrends {
            region: region.to_string(),
            growth_rate: round3(1.05 + (seed % 100) as f64 / 1000.0),
            competitors: to_strings(&["Contoso", "Fabrikam", "Globex", "Initech"]),
            trends: to_strings(&[
                "Circular economy",
                "Eco-packaging",
                "Blockchain tracking",
                "Reverse logistics",
            ]),
        }
    }

    fn customer_signals(&self, product: &str) -> CustomerSignals {
        let seed = stable_seed(product);
        let sentiments = ["positive", "neutral", "negative"];
        let needs = [
            "Lower cost",
            "More sustainability",
            "Better usability",
            "Transparent sourcing",
        ];
        // Keep three of the four candidate needs, dropping one by seed.
        let dropped = (seed % needs.len() as u64) as usize;
        let top_requests = needs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != dropped)
            .map(|(_, n)| n.to_string())
            .collect();

        CustomerSignals {
            product: product.to_string(),
            average_sentiment: sentiments[(seed % sentiments.len() as u64) as usize].to_string(),
            top_requests,
        }
    }

    fn regulations(&self, region: &str) -> RegulatoryOutlook {
        let seed = stable_seed(region);
        RegulatoryOutlook {
            region: region.to_string(),
            regulatory_ready: seed % 100 >= 15,
            esg_frameworks: to_strings(&["GRI", "SASB", "CSRD"]),
            co2_intensity_cap: format!("{:.2} kg/pack", 0.8 + (seed % 30) as f64 / 100.0),
        }
    }

    fn partners(&self, region: &str) -> PartnerNetwork {
        PartnerNetwork {
            region: region.to_string(),
            suppliers: (1..=3).map(|i| format!("Supplier {}", i)).collect(),
            distributors: (1..=2).map(|i| format!("Distributor {}", i)).collect(),
        }
    }

    fn design_assets(&self) -> DesignAssets {
        DesignAssets {
            palette: "teal/charcoal".to_string(),
            style: "modern".to_string(),
            components: to_strings(&["icon set", "illustrations", "presentation template"]),
        }
    }
}

#[async_trait]
impl DataAccess for StaticDataAccess {
    async fn fetch(&self, query: FetchQuery) -> FetchResult<FetchRecord> {
        let record = match query {
            FetchQuery::MarketTrends { region } => {
                FetchRecord::MarketTrends(self.market_trends(&region))
            }
            FetchQuery::CustomerSignals { product } => {
                FetchRecord::CustomerSignals(self.customer_signals(&product))
            }
            FetchQuery::Regulations { region } => {
                FetchRecord::Regulations(self.regulations(&region))
            }
            FetchQuery::Partners { region } => FetchRecord::Partners(self.partners(&region)),
            FetchQuery::DesignAssets => FetchRecord::DesignAssets(self.design_assets()),
        };
        Ok(record)
    }
}

/// FNV-1a over the input, stable across runs and toolchains.
fn stable_seed(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in input.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Data source that refuses every fetch. Drives the degraded-result path in
/// tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingDataAccess;

#[cfg(test)]
#[async_trait]
impl DataAccess for FailingDataAccess {
    async fn fetch(&self, query: FetchQuery) -> FetchResult<FetchRecord> {
        Err(DataAccessError::NotAvailable(format!(
            "fetch refused for {:?}",
            query
        )))
    }
}
