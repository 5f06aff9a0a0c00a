//! Replica handle (C2) — one container and its work pipeline.
//!
//! ```text
//! init -> starting -> running -> stopped -> terminated
//!   \        \           \         /
//!    \________\___________\_______/ -> error  (absorbing)
//! ```
//!
//! The dispatcher and the replica's own worker both touch this handle;
//! mutual exclusion is via `inner`'s mutex, never a global lock. The
//! per-replica job queue lives *inside* `inner` deliberately — see
//! `run_drain_step` for why the drain-on-empty transition and `enqueue`
//! must share one critical section.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{info, warn};

use crate::engine::{ContainerEngine, ContainerSpec};
use crate::error::{Result, SchedulerError};
use crate::estimator::Estimator;
use crate::job::{JobHandle, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReplicaStatus {
    Init,
    Starting,
    Running,
    Stopped,
    Terminated,
    Error,
}

struct ReplicaInner {
    status: ReplicaStatus,
    time_when_ready: Instant,
    container_id: Option<String>,
    ip: Option<IpAddr>,
    receiver: mpsc::Receiver<JobHandle>,
}

pub struct Replica {
    pub name: String,
    sender: mpsc::Sender<JobHandle>,
    inner: Mutex<ReplicaInner>,
}

static REPLICA_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Replica {
    /// The permanent index-0 replica: forever `Init`, forever reporting an
    /// infinite time-to-ready. Eliminates the "empty fleet" branch at
    /// dispatch — see `Dispatcher::dispatch_one`.
    pub fn sentinel() -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            name: "replica_sentinel".to_string(),
            sender,
            inner: Mutex::new(ReplicaInner {
                status: ReplicaStatus::Init,
                time_when_ready: Instant::now(),
                container_id: None,
                ip: None,
                receiver,
            }),
        }
    }

    pub fn new(queue_capacity: usize) -> Self {
        let n = REPLICA_COUNTER.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel(queue_capacity);
        Self {
            name: format!("replica_{n}"),
            sender,
            inner: Mutex::new(ReplicaInner {
                status: ReplicaStatus::Init,
                time_when_ready: Instant::now(),
                container_id: None,
                ip: None,
                receiver,
            }),
        }
    }

    pub fn status(&self) -> ReplicaStatus {
        self.inner.lock().expect("replica mutex poisoned").status
    }

    /// Predicted wall-clock delay until this replica could begin a newly
    /// enqueued job. An effectively infinite sentinel outside of
    /// `{Starting, Running}` so an unstarted or torn-down replica never
    /// looks attractive to the dispatcher.
    pub fn time_to_ready(&self) -> Duration {
        let inner = self.inner.lock().expect("replica mutex poisoned");
        match inner.status {
            ReplicaStatus::Starting | ReplicaStatus::Running => {
                inner.time_when_ready.saturating_duration_since(Instant::now())
            }
            _ => Duration::MAX,
        }
    }

    /// Enqueue a job onto this replica's private queue. Rejects if the
    /// replica is in a terminal-or-errored state; surfaces a full queue as
    /// an error rather than blocking. The status check, the send, and the
    /// `time_when_ready` advance all happen under one lock acquisition so
    /// this can't race a concurrent drain-on-empty in `run`.
    pub fn enqueue(&self, job: JobHandle) -> Result<()> {
        let mut inner = self.inner.lock().expect("replica mutex poisoned");
        if matches!(
            inner.status,
            ReplicaStatus::Stopped | ReplicaStatus::Terminated | ReplicaStatus::Error
        ) {
            return Err(SchedulerError::ReplicaUnavailable(self.name.clone()));
        }

        match self.sender.try_send(job.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(SchedulerError::QueueFull),
            Err(TrySendError::Closed(_)) => {
                return Err(SchedulerError::ReplicaUnavailable(self.name.clone()))
            }
        }

        let duration = {
            let mut j = job.lock().expect("job mutex poisoned");
            j.status = JobStatus::Pending;
            j.duration
        };
        inner.time_when_ready += duration;
        Ok(())
    }

    /// Create, start, and health-check the container. Pre-sets
    /// `time_when_ready` so concurrently arriving jobs see a meaningful
    /// estimate while the container is still booting.
    pub async fn setup(
        &self,
        engine: &dyn ContainerEngine,
        estimator: &Estimator,
        image: &str,
        network: &str,
        port: u16,
        healthcheck_attempts: u32,
        healthcheck_interval: Duration,
    ) {
        let start_of_setup = Instant::now();
        {
            let mut inner = self.inner.lock().expect("replica mutex poisoned");
            inner.status = ReplicaStatus::Starting;
            inner.time_when_ready = Instant::now() + estimator.setup.read();
        }

        let spec = ContainerSpec {
            image: image.to_string(),
            port,
            network: network.to_string(),
            name: self.name.clone(),
        };

        let handle = match engine.create(&spec).await {
            Ok(h) => h,
            Err(e) => {
                warn!(replica = %self.name, error = %e, "container create failed");
                self.fail();
                return;
            }
        };
        {
            let mut inner = self.inner.lock().expect("replica mutex poisoned");
            inner.container_id = Some(handle.id.clone());
        }

        if let Err(e) = engine.start(&handle.id).await {
            warn!(replica = %self.name, error = %e, "container start failed");
            let _ = engine.remove(&handle.id).await;
            self.fail();
            return;
        }

        let ip = match engine.inspect_ip(&handle.id, network).await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(replica = %self.name, error = %e, "container inspect failed");
                let _ = engine.stop(&handle.id).await;
                let _ = engine.remove(&handle.id).await;
                self.fail();
                return;
            }
        };
        {
            let mut inner = self.inner.lock().expect("replica mutex poisoned");
            inner.ip = Some(ip);
        }

        if !self
            .poll_health(ip, port, healthcheck_attempts, healthcheck_interval)
            .await
        {
            warn!(replica = %self.name, "health check exhausted");
            let _ = engine.stop(&handle.id).await;
            let _ = engine.remove(&handle.id).await;
            self.fail();
            return;
        }

        {
            let mut inner = self.inner.lock().expect("replica mutex poisoned");
            inner.time_when_ready = Instant::now();
        }
        estimator.setup.update(start_of_setup.elapsed());
        info!(replica = %self.name, elapsed = ?start_of_setup.elapsed(), "replica ready");
    }

    async fn poll_health(
        &self,
        ip: IpAddr,
        port: u16,
        attempts: u32,
        interval: Duration,
    ) -> bool {
        let url = format!("http://{ip}:{port}/ok");
        for _ in 0..attempts {
            if let Ok(resp) = reqwest::get(&url).await {
                if let Ok(body) = resp.text().await {
                    if body == "ok" {
                        return true;
                    }
                }
            }
            tokio::time::sleep(interval).await;
        }
        false
    }

    /// Drain loop: while the queue is non-empty, pop a job, run it against
    /// the replica's HTTP endpoint, feed the job-time estimator. Exits as
    /// soon as the queue is observed empty — this is a non-blocking pop,
    /// not a wait.
    pub async fn run(&self, estimator: &Estimator, port: u16) {
        {
            let mut inner = self.inner.lock().expect("replica mutex poisoned");
            if inner.status != ReplicaStatus::Error {
                inner.status = ReplicaStatus::Running;
            }
        }

        let ip = match self.inner.lock().expect("replica mutex poisoned").ip {
            Some(ip) => ip,
            None => return,
        };
        let url = format!("http://{ip}:{port}/");

        loop {
            let job = match self.pop_or_stop() {
                Some(job) => job,
                None => break,
            };

            let (id, input) = {
                let mut j = job.lock().expect("job mutex poisoned");
                j.mark_running();
                (j.id, j.input.clone())
            };

            let outcome = predict(&url, &input).await;
            match outcome {
                Ok(output) => {
                    let elapsed = {
                        let mut j = job.lock().expect("job mutex poisoned");
                        let start = j.start.expect("running job has a start timestamp");
                        j.mark_done(output);
                        (chrono::Utc::now() - start)
                            .to_std()
                            .unwrap_or(Duration::ZERO)
                    };
                    estimator.job.update(elapsed);
                    info!(replica = %self.name, job = %id, "job completed");
                }
                Err(e) => {
                    warn!(replica = %self.name, job = %id, error = %e, "prediction failed");
                    job.lock().expect("job mutex poisoned").mark_error();
                    // Remaining queued jobs are abandoned with the replica —
                    // see the "Replica prediction failure" disposition.
                    break;
                }
            }
        }
    }

    /// Pop one job, or — observed under the same lock — flip to `Stopped`
    /// if the queue is empty. Keeping both under one critical section is
    /// what stops an enqueue from sneaking in between "queue looked empty"
    /// and "status flipped to stopped".
    fn pop_or_stop(&self) -> Option<JobHandle> {
        let mut inner = self.inner.lock().expect("replica mutex poisoned");
        match inner.receiver.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                inner.status = ReplicaStatus::Stopped;
                None
            }
        }
    }

    /// Stop and remove the container. Failure transitions to `Error`
    /// rather than `Terminated`; the container may leak.
    pub async fn cleanup(&self, engine: &dyn ContainerEngine) {
        let container_id = self
            .inner
            .lock()
            .expect("replica mutex poisoned")
            .container_id
            .clone();
        let Some(id) = container_id else {
            // setup never got far enough to create a container.
            return;
        };

        if let Err(e) = engine.stop(&id).await {
            warn!(replica = %self.name, error = %e, "container stop failed");
            self.fail();
            return;
        }
        if let Err(e) = engine.remove(&id).await {
            warn!(replica = %self.name, error = %e, "container remove failed");
            self.fail();
            return;
        }
        self.inner.lock().expect("replica mutex poisoned").status = ReplicaStatus::Terminated;
    }

    fn fail(&self) {
        self.inner.lock().expect("replica mutex poisoned").status = ReplicaStatus::Error;
    }
}

async fn predict(url: &str, input: &str) -> anyhow::Result<String> {
    #[derive(serde::Serialize)]
    struct Req<'a> {
        input: &'a str,
    }
    #[derive(serde::Deserialize)]
    struct Resp {
        output: String,
    }

    let resp = reqwest::Client::new()
        .post(url)
        .json(&Req { input })
        .send()
        .await?
        .error_for_status()?;
    let parsed: Resp = resp.json().await?;
    Ok(parsed.output)
}
