//! Error types shared by the dispatcher, replica workers, and the registry.
//!
//! Mirrors the corpus convention of one `thiserror` enum per crate with an
//! `Internal(#[from] anyhow::Error)` catch-all, and a `#[from]` bridge from
//! the container-engine port's own error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("replica queue full")]
    QueueFull,

    #[error("replica unavailable: {0}")]
    ReplicaUnavailable(String),

    #[error("container engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Errors surfaced by a `ContainerEngine` implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("create failed: {0}")]
    CreateFailed(String),

    #[error("start failed: {0}")]
    StartFailed(String),

    #[error("inspect failed: {0}")]
    InspectFailed(String),

    #[error("stop failed: {0}")]
    StopFailed(String),

    #[error("remove failed: {0}")]
    RemoveFailed(String),
}
