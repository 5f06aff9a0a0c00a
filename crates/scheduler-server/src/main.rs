//! scheduler-server — standalone binary: wires the dispatch engine to an
//! HTTP front door and a background persister.
//!
//! Reads config from env vars (see `scheduler_core::config::CoreConfig`
//! plus `SCHEDULER_BIND_ADDR`, documented in the crate's README table).

use std::sync::Arc;

use scheduler_core::engine::ContainerEngine;
use scheduler_core::{persistence, CoreConfig, Dispatcher, Estimator, JobRegistry, ReplicaTable};
use scheduler_docker::DockerEngine;
use scheduler_server::router::build_router;
use scheduler_server::state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scheduler_server=debug".into()),
        )
        .init();

    let config = Arc::new(CoreConfig::from_env());
    let bind_addr =
        std::env::var("SCHEDULER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    let registry = Arc::new(JobRegistry::new());
    if let Some(path) = &config.state_file {
        persistence::restore(&registry, path);
    }

    let estimator = Arc::new(Estimator::new(config.setup_time_prior, config.job_time_prior));
    let table = Arc::new(ReplicaTable::new());
    let engine: Arc<dyn ContainerEngine> = Arc::new(
        DockerEngine::connect().expect("failed to connect to the Docker daemon"),
    );

    let (dispatcher, dispatch_tx) =
        Dispatcher::new(table.clone(), estimator.clone(), engine, config.clone());
    tokio::spawn(dispatcher.run());
    tracing::info!("dispatcher started");

    if let Some(path) = config.state_file.clone() {
        let registry = registry.clone();
        let interval = config.persist_interval;
        tokio::spawn(async move {
            persistence::run_persister(registry, path, interval).await;
        });
        tracing::info!(interval = ?config.persist_interval, "persister started");
    }

    let state = AppState {
        registry,
        replicas: table,
        estimator,
        dispatch: dispatch_tx,
    };

    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_addr}: {e}"));
    tracing::info!("scheduler-server listening on {bind_addr}");

    axum::serve(listener, app).await.expect("server error");
}
