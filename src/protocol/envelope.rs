//! Message envelopes with correlation IDs for tracking coordinator/worker exchanges.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::types::{MessageKind, Payload};

/// The atomic unit of communication between the coordinator and workers.
///
/// Envelopes are immutable once sent. A request carries no correlation id; a
/// response's `correlation_id` is always the id of the request it answers,
/// which is what the conversation tracker keys its waits on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Unique message ID (ULID)
    pub id: String,
    /// ID of the request this envelope answers; `None` for the first
    /// message in a chain.
    pub correlation_id: Option<String>,
    /// Sender id
    pub sender: String,
    /// Recipient id
    pub recipient: String,
    /// Message kind
    pub kind: MessageKind,
    /// Kind-dependent payload
    pub payload: Payload,
    /// Send timestamp (unix ms)
    pub sent_at: i64,
}

impl Envelope {
    /// Create a new request envelope.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        kind: MessageKind,
        payload: Payload,
    ) -> Self {
        Self {
            id: generate_id(),
            correlation_id: None,
            sender: sender.into(),
            recipient: recipient.into(),
            kind,
            payload,
            sent_at: current_timestamp(),
        }
    }

    /// Create a response envelope addressed back to this envelope's sender,
    /// correlated to this envelope's id.
    pub fn reply(&self, kind: MessageKind, payload: Payload) -> Self {
        Self {
            id: generate_id(),
            correlation_id: Some(self.id.clone()),
            sender: self.recipient.clone(),
            recipient: self.sender.clone(),
            kind,
            payload,
            sent_at: current_timestamp(),
        }
    }

    /// Whether this envelope is a response to the given request id.
    pub fn answers(&self, request_id: &str) -> bool {
        self.correlation_id.as_deref() == Some(request_id)
    }
}

fn generate_id() -> String {
    ulid::Ulid::new().to_string()
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
