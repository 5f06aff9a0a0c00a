//! Job — one submitted prediction.
//!
//! A `Job` is created by ingress, handed to the dispatcher, and from then on
//! mutated only by the replica worker that owns it. Status progresses
//! monotonically: `Pending -> Running -> (Done | Error)`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::estimator::Estimator;

/// Shared handle to a job: the registry, the dispatcher's channel, and the
/// owning replica's private queue all hold clones of the same `Arc`, so a
/// worker's in-place mutation is immediately visible to `/status` and
/// `/data` lookups without a second write-back step.
pub type JobHandle = Arc<Mutex<Job>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl JobStatus {
    /// The string vocabulary the `/status/:id` endpoint speaks.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "queued",
            JobStatus::Running => "processing",
            JobStatus::Done => "finished",
            JobStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub input: String,
    pub output: String,
    pub status: JobStatus,
    /// The scheduler's prior estimate of how long this job will occupy a
    /// replica — used to advance `Replica::time_when_ready` on enqueue.
    pub duration: Duration,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job, defaulting `duration` to the estimator's
    /// current job-time mean (the declared duration a caller didn't hint).
    pub fn new(input: String, estimator: &Estimator) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            output: String::new(),
            status: JobStatus::Pending,
            duration: estimator.job.read(),
            start: None,
            end: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.start = Some(Utc::now());
    }

    pub fn mark_done(&mut self, output: String) {
        self.output = output;
        self.status = JobStatus::Done;
        self.end = Some(Utc::now());
    }

    pub fn mark_error(&mut self) {
        self.status = JobStatus::Error;
        self.end = Some(Utc::now());
    }

    /// `end - start`, valid only once the job has reached a terminal state.
    pub fn latency(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end >= start => (end - start).to_std().ok(),
            _ => None,
        }
    }
}
