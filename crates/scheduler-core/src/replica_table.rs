//! Replica table — an append-only ordered sequence of replica handles.
//!
//! Single-writer (the dispatcher appends), single-reader (the dispatcher
//! scans), so a plain mutex suffices — no `RwLock` needed. Entries are
//! never removed: a terminated replica remains, reporting an effectively
//! infinite `time_to_ready` so the dispatcher simply skips it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::replica::Replica;

pub struct ReplicaTable {
    replicas: Mutex<Vec<Arc<Replica>>>,
}

impl ReplicaTable {
    /// Index 0 is a sentinel replica, permanently `Init`, simplifying the
    /// "no replicas yet" edge case without a branch on an empty table.
    pub fn new() -> Self {
        Self {
            replicas: Mutex::new(vec![Arc::new(Replica::sentinel())]),
        }
    }

    pub fn push(&self, replica: Arc<Replica>) -> usize {
        let mut replicas = self.replicas.lock().expect("replica table mutex poisoned");
        replicas.push(replica);
        replicas.len() - 1
    }

    /// Snapshot of `(index, time_to_ready)` for every replica, in table
    /// order.
    pub fn scan_time_to_ready(&self) -> Vec<(usize, Duration)> {
        let replicas = self.replicas.lock().expect("replica table mutex poisoned");
        replicas
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.time_to_ready()))
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<Arc<Replica>> {
        self.replicas
            .lock()
            .expect("replica table mutex poisoned")
            .get(index)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<Arc<Replica>> {
        self.replicas.lock().expect("replica table mutex poisoned").clone()
    }
}

impl Default for ReplicaTable {
    fn default() -> Self {
        Self::new()
    }
}
