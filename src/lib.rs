//! planforge - Multi-agent product-launch planning over a typed message protocol.
//!
//! A coordinator discovers six specialist workers, negotiates proposals with
//! them, assigns one task each and aggregates their reports into a single
//! launch plan. All traffic moves as correlated envelopes through an
//! in-process router that keeps a full audit log.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod coordinator;
pub mod datasource;
pub mod error;
pub mod journal;
pub mod logging;
pub mod plan;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod workers;

pub use coordinator::{execute_run, execute_run_with, Coordinator, RunOutcome};
pub use error::{Error, Result};
pub use plan::{AggregatedPlan, PlanEntry};
