//! `ContainerEngine` — the port the replica state machine drives.
//!
//! The container engine itself (Docker, or anything that can create /
//! start / inspect / stop / remove a container) is an external
//! collaborator, out of scope for this crate. `scheduler-core` depends
//! only on this trait, never on a concrete client — the same separation
//! the corpus uses between `sem_os_core::ports` and `sem_os_postgres`.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::EngineError;

pub type Result<T> = std::result::Result<T, EngineError>;

/// What to create: an image, a single exposed TCP port, network
/// membership, and a display name for the container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub image: String,
    pub port: u16,
    pub network: String,
    pub name: String,
}

/// Opaque engine-assigned identity for a created container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerHandle>;
    async fn start(&self, id: &str) -> Result<()>;
    /// Resolve the container's address on `network`.
    async fn inspect_ip(&self, id: &str, network: &str) -> Result<IpAddr>;
    async fn stop(&self, id: &str) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<()>;
}
