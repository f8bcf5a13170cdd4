//! Worker registry: maps worker ids to addressable handles.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// An addressable worker known to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerHandle {
    pub worker_id: String,
    pub display_name: String,
}

impl WorkerHandle {
    pub fn new(worker_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Run-scoped worker map. Read-mostly; safe for concurrent lookup.
///
/// Iteration order is stable (sorted by worker id) so discovery fan-out and
/// reporting are deterministic.
#[derive(Debug, Default)]
pub struct Registry {
    workers: Mutex<BTreeMap<String, WorkerHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: WorkerHandle) {
        let mut workers = self.workers.lock().unwrap();
        workers.insert(handle.worker_id.clone(), handle);
    }

    pub fn get(&self, worker_id: &str) -> Option<WorkerHandle> {
        self.workers.lock().unwrap().get(worker_id).cloned()
    }

    pub fn contains(&self, worker_id: &str) -> bool {
        self.workers.lock().unwrap().contains_key(worker_id)
    }

    pub fn worker_ids(&self) -> Vec<String> {
        self.workers.lock().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
