//! `ContainerEngine` against the local Docker daemon, via `bollard`.
//!
//! `scheduler-core` never depends on this crate; `scheduler-server` wires
//! the two together at startup. A second, in-memory implementation behind
//! the `testing` module plays the role the teacher's own `MemoryStore`
//! plays next to `PostgresProcessStore`: a fast fake for tests that never
//! touches a real daemon.

pub mod testing;

use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::network::ConnectNetworkOptions;
use bollard::Docker;
use scheduler_core::engine::{ContainerEngine, ContainerHandle, ContainerSpec, Result};
use scheduler_core::error::EngineError;
use tracing::warn;

/// Talks to whatever Docker daemon `bollard` finds via the local socket
/// (`DOCKER_HOST`, or the platform default).
pub struct DockerEngine {
    client: Docker,
}

impl DockerEngine {
    pub fn connect() -> anyhow::Result<Self> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let config = Config {
            image: Some(spec.image.clone()),
            exposed_ports: Some(
                [(format!("{}/tcp", spec.port), std::collections::HashMap::new())]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(options), config)
            .await
            .map_err(|e| EngineError::CreateFailed(e.to_string()))?;

        for warning in response.warnings {
            warn!(container = %spec.name, %warning, "docker reported a warning on create");
        }

        self.client
            .connect_network(
                &spec.network,
                ConnectNetworkOptions {
                    container: response.id.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| EngineError::CreateFailed(e.to_string()))?;

        Ok(ContainerHandle { id: response.id })
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EngineError::StartFailed(e.to_string()))
    }

    async fn inspect_ip(&self, id: &str, network: &str) -> Result<IpAddr> {
        let details = self
            .client
            .inspect_container(id, None)
            .await
            .map_err(|e| EngineError::InspectFailed(e.to_string()))?;

        let address = details
            .network_settings
            .and_then(|ns| ns.networks)
            .and_then(|networks| networks.get(network).cloned())
            .and_then(|n| n.ip_address)
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| {
                EngineError::InspectFailed(format!(
                    "container {id} has no address on network {network}"
                ))
            })?;

        IpAddr::from_str(&address)
            .map_err(|e| EngineError::InspectFailed(format!("unparseable container address: {e}")))
    }

    async fn stop(&self, id: &str) -> Result<()> {
        self.client
            .stop_container(id, None)
            .await
            .map_err(|e| EngineError::StopFailed(e.to_string()))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.client
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| EngineError::RemoveFailed(e.to_string()))
    }
}
