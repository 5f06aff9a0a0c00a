//! Moving-average estimator (C1).
//!
//! Tracks a running mean of setup-time and job-time, seeded with an
//! operator-supplied prior so the dispatcher never sees `E[setup] = 0`
//! during a cold start. No windowing: an infinite arithmetic mean is
//! acceptable because inference times for a given model are approximately
//! stationary.

use std::sync::Mutex;
use std::time::Duration;

/// A running mean duration, serialized under its own mutex. Neither `read`
/// nor `update` ever blocks on I/O.
#[derive(Debug)]
pub struct MovingAverage {
    inner: Mutex<MovingAverageInner>,
}

#[derive(Debug, Clone, Copy)]
struct MovingAverageInner {
    mean_nanos: u128,
    n: u64,
}

impl MovingAverage {
    /// Seed with `(initial, n=1)` so the first real sample blends with the
    /// caller-supplied prior instead of starting from zero.
    pub fn new(initial: Duration) -> Self {
        Self {
            inner: Mutex::new(MovingAverageInner {
                mean_nanos: initial.as_nanos(),
                n: 1,
            }),
        }
    }

    pub fn read(&self) -> Duration {
        let guard = self.inner.lock().expect("estimator mutex poisoned");
        Duration::from_nanos(guard.mean_nanos.min(u64::MAX as u128) as u64)
    }

    /// `mean <- (mean*n + sample) / (n+1)` in integer nanoseconds, then
    /// `n <- n+1`.
    pub fn update(&self, sample: Duration) {
        let mut guard = self.inner.lock().expect("estimator mutex poisoned");
        let n = guard.n as u128;
        guard.mean_nanos = (guard.mean_nanos * n + sample.as_nanos()) / (n + 1);
        guard.n += 1;
    }
}

/// The pair of moving averages the dispatcher and replica workers consult.
#[derive(Debug)]
pub struct Estimator {
    pub setup: MovingAverage,
    pub job: MovingAverage,
}

impl Estimator {
    pub fn new(setup_prior: Duration, job_prior: Duration) -> Self {
        Self {
            setup: MovingAverage::new(setup_prior),
            job: MovingAverage::new(job_prior),
        }
    }
}
