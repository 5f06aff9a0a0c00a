//! Environment-variable configuration, read once at startup.
//!
//! Follows the corpus convention (`sem_os_server::main`) of reading
//! required values with `expect("... must be set")` and optional ones
//! with `.ok().and_then(...).unwrap_or(default)`.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REPLICA_NETWORK: &str = "serverless-model-example_default";
pub const DOCKER_OVERHEAD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// `MODEL_PREDICT_TIME` — prior for the job-time estimator.
    pub job_time_prior: Duration,
    /// `MODEL_SETUP_TIME` — prior for the setup-time estimator, plus the
    /// fixed Docker-overhead constant.
    pub setup_time_prior: Duration,
    /// `APP_REPLICA_IMAGE`
    pub replica_image: String,
    /// `APP_REPLICA_NETWORK`
    pub replica_network: String,
    /// `STATE_FILE` — snapshot path; persistence disabled if unset.
    pub state_file: Option<PathBuf>,
    /// `SCHEDULER_DISPATCH_QUEUE_CAPACITY`
    pub queue_capacity: usize,
    /// `SCHEDULER_REPLICA_PORT`
    pub replica_port: u16,
    /// `SCHEDULER_HEALTHCHECK_ATTEMPTS`
    pub healthcheck_attempts: u32,
    /// `SCHEDULER_HEALTHCHECK_INTERVAL_MS`
    pub healthcheck_interval: Duration,
    /// `SCHEDULER_SPAWN_TOLERANCE_MS` — the dispatcher's tau.
    pub spawn_tolerance: Duration,
    /// `SCHEDULER_PERSIST_INTERVAL_SECS`
    pub persist_interval: Duration,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self {
            job_time_prior: env_secs("MODEL_PREDICT_TIME", 5),
            setup_time_prior: env_secs("MODEL_SETUP_TIME", 10) + DOCKER_OVERHEAD,
            replica_image: std::env::var("APP_REPLICA_IMAGE")
                .expect("APP_REPLICA_IMAGE must be set"),
            replica_network: std::env::var("APP_REPLICA_NETWORK")
                .unwrap_or_else(|_| DEFAULT_REPLICA_NETWORK.to_string()),
            state_file: std::env::var("STATE_FILE").ok().map(PathBuf::from),
            queue_capacity: env_parsed("SCHEDULER_DISPATCH_QUEUE_CAPACITY", 100),
            replica_port: env_parsed("SCHEDULER_REPLICA_PORT", 8000),
            healthcheck_attempts: env_parsed("SCHEDULER_HEALTHCHECK_ATTEMPTS", 100),
            healthcheck_interval: Duration::from_millis(env_parsed(
                "SCHEDULER_HEALTHCHECK_INTERVAL_MS",
                500,
            )),
            spawn_tolerance: Duration::from_millis(env_parsed("SCHEDULER_SPAWN_TOLERANCE_MS", 500)),
            persist_interval: Duration::from_secs(env_parsed(
                "SCHEDULER_PERSIST_INTERVAL_SECS",
                10,
            )),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_parsed(key, default_secs))
}
