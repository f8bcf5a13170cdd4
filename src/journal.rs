//! Run journal: ordered, human-readable status lines per participant.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One status line from one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLine {
    pub worker_id: String,
    pub message: String,
    /// Record timestamp (unix ms)
    pub at: i64,
}

/// Append-only, run-scoped status log shared by the coordinator and workers.
///
/// This is the audit output handed to presentation at the end of a run;
/// operational logging goes through `tracing` separately.
#[derive(Debug, Default)]
pub struct Journal {
    lines: Mutex<Vec<StatusLine>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, worker_id: impl Into<String>, message: impl Into<String>) {
        let line = StatusLine {
            worker_id: worker_id.into(),
            message: message.into(),
            at: current_timestamp(),
        };
        tracing::debug!("[{}] {}", line.worker_id, line.message);
        self.lines.lock().unwrap().push(line);
    }

    /// Ordered snapshot of every line recorded so far.
    pub fn snapshot(&self) -> Vec<StatusLine> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines recorded by a single participant, in order.
    pub fn for_worker(&self, worker_id: &str) -> Vec<StatusLine> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.worker_id == worker_id)
            .cloned()
            .collect()
    }
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
