//! `scheduler-core` — the dispatch and replica-lifecycle engine.
//!
//! This crate holds the five cooperating pieces the rest of the system
//! wires together: the moving-average estimator (C1), the replica handle
//! and its state machine (C2), the dispatcher (C3), and the job registry
//! plus its persister (C4). The HTTP ingress and the concrete container
//! engine are external crates that depend on this one, never the reverse.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod job;
pub mod persistence;
pub mod registry;
pub mod replica;
pub mod replica_table;

pub use config::CoreConfig;
pub use dispatcher::Dispatcher;
pub use engine::{ContainerEngine, ContainerHandle, ContainerSpec};
pub use error::{EngineError, SchedulerError};
pub use estimator::Estimator;
pub use job::{Job, JobHandle, JobStatus};
pub use registry::JobRegistry;
pub use replica::{Replica, ReplicaStatus};
pub use replica_table::ReplicaTable;
