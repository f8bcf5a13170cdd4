//! Error types for planforge.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No inbox registered for the recipient. Fatal to that single send,
    /// reported to the sender, never silently dropped.
    #[error("No inbox registered for recipient '{0}'")]
    UnknownRecipient(String),

    /// A response did not arrive in time. Non-fatal; the worker is excluded
    /// from the remainder of the run.
    #[error("Timed out waiting for correlation id {correlation_id}")]
    Timeout { correlation_id: String },

    /// A correlation id was awaited again after its response was consumed.
    /// Misuse, not an operational condition.
    #[error("Correlation id already consumed: {0}")]
    AlreadyConsumed(String),

    /// Nothing answered discovery; no plan can be produced.
    #[error("No workers discovered")]
    NoWorkersDiscovered,

    #[error("{0}")]
    Other(String),
}
