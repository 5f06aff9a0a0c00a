//! scheduler-server — HTTP ingress for the inference scheduler.
//!
//! Routes:
//!   POST /push             — submit a prediction job
//!   GET  /status/:id       — job lifecycle stage
//!   GET  /data/:id         — finished job input/output/latency
//!   GET  /health           — liveness check
//!   GET  /healthz/replicas — replica fleet diagnostics

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
