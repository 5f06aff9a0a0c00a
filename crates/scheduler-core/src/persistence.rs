//! Best-effort snapshot/restore of the job registry.
//!
//! Encoded with `bincode`, the same wire-format choice the teacher makes
//! for its own binary snapshot format (`esper_snapshot::WorldSnapshot`).
//! Written to a temp file next to `STATE_FILE` and renamed into place so a
//! crash mid-write can't leave a half-written snapshot behind; failures
//! are logged and the next tick simply retries.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::job::{Job, JobStatus};
use crate::registry::JobRegistry;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RegistrySnapshot {
    schema_version: u32,
    jobs: Vec<PersistedJob>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedJob {
    id: Uuid,
    input: String,
    output: String,
    status: JobStatus,
    duration_nanos: u64,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl From<&Job> for PersistedJob {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            input: job.input.clone(),
            output: job.output.clone(),
            status: job.status,
            duration_nanos: job.duration.as_nanos().min(u64::MAX as u128) as u64,
            start: job.start,
            end: job.end,
        }
    }
}

impl From<PersistedJob> for Job {
    fn from(p: PersistedJob) -> Self {
        Job {
            id: p.id,
            input: p.input,
            output: p.output,
            status: p.status,
            duration: Duration::from_nanos(p.duration_nanos),
            start: p.start,
            end: p.end,
        }
    }
}

/// Serialize the registry's current contents and atomically replace
/// `path`. Logs and returns `Ok(())` is not guaranteed on I/O failure —
/// callers are expected to log the error and keep running.
pub fn save(registry: &JobRegistry, path: &Path) -> anyhow::Result<()> {
    let jobs: Vec<PersistedJob> = registry
        .snapshot()
        .iter()
        .map(|handle| PersistedJob::from(&*handle.lock().expect("job mutex poisoned")))
        .collect();
    let snapshot = RegistrySnapshot {
        schema_version: SCHEMA_VERSION,
        jobs,
    };
    let bytes = bincode::serialize(&snapshot)?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = if let Some(dir) = dir {
        tempfile::NamedTempFile::new_in(dir)?
    } else {
        tempfile::NamedTempFile::new()?
    };
    use std::io::Write;
    tmp.write_all(&bytes)?;
    tmp.persist(path)?;
    Ok(())
}

/// Deserialize a snapshot from `path`, returning an empty set of jobs if
/// the file doesn't exist yet.
pub fn load(path: &Path) -> anyhow::Result<Vec<(Uuid, Job)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path)?;
    let snapshot: RegistrySnapshot = bincode::deserialize(&bytes)?;
    Ok(snapshot
        .jobs
        .into_iter()
        .map(|p| (p.id, Job::from(p)))
        .collect())
}

/// Restore `registry` from `path` if persistence is configured and the
/// file exists. Replica state is never recovered — only terminal-state
/// outputs survive a restart.
pub fn restore(registry: &JobRegistry, path: &Path) {
    match load(path) {
        Ok(jobs) => {
            let count = jobs.len();
            for (id, job) in jobs {
                registry.insert_handle(id, std::sync::Arc::new(std::sync::Mutex::new(job)));
            }
            info!(count, path = %path.display(), "restored job registry from snapshot");
        }
        Err(e) => {
            error!(error = %e, path = %path.display(), "failed to restore job registry, starting empty");
        }
    }
}

/// Background persister: every `interval`, best-effort snapshot the
/// registry to `path`. Runs until the process exits; spawn with
/// `tokio::spawn`.
pub async fn run_persister(registry: std::sync::Arc<JobRegistry>, path: std::path::PathBuf, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match save(&registry, &path) {
            Ok(()) => info!(path = %path.display(), count = registry.len(), "persisted job registry"),
            Err(e) => error!(error = %e, path = %path.display(), "failed to persist job registry"),
        }
    }
}
