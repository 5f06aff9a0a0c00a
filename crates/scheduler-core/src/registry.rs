//! Job registry (C4) — process-wide id -> Job mapping.
//!
//! Multi-writer (ingress inserts), multi-reader (status/data queries and
//! the persister), so unlike the single-writer replica table this one is
//! mutex-guarded on every access. Each entry is a `JobHandle` — the same
//! `Arc<Mutex<Job>>` a replica worker mutates in place — so a concurrent
//! `push` and `status` call always see a consistent view of any given job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::job::{Job, JobHandle};

#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly created job and return the shared handle the
    /// dispatcher and replica worker will mutate.
    pub fn push(&self, job: Job) -> JobHandle {
        let id = job.id;
        let handle: JobHandle = Arc::new(Mutex::new(job));
        self.jobs
            .lock()
            .expect("registry mutex poisoned")
            .insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: Uuid) -> Option<JobHandle> {
        self.jobs.lock().expect("registry mutex poisoned").get(&id).cloned()
    }

    /// Insert a handle as-is — used when restoring from a snapshot.
    pub fn insert_handle(&self, id: Uuid, handle: JobHandle) {
        self.jobs.lock().expect("registry mutex poisoned").insert(id, handle);
    }

    /// Snapshot of every job currently held, for the persister.
    pub fn snapshot(&self) -> Vec<JobHandle> {
        self.jobs
            .lock()
            .expect("registry mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
