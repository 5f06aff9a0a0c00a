//! Dispatcher (C3) — decides which replica absorbs each arriving job.
//!
//! A single long-lived task consuming a bounded inbox, shaped like the
//! corpus's background-task convention
//! (`sem_os_server::dispatcher::OutboxDispatcher::run`): a `loop` around a
//! channel receive, with state shared through `Arc`s rather than captured
//! by reference.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::CoreConfig;
use crate::engine::ContainerEngine;
use crate::estimator::Estimator;
use crate::job::JobHandle;
use crate::replica::Replica;
use crate::replica_table::ReplicaTable;

pub struct Dispatcher {
    table: Arc<ReplicaTable>,
    estimator: Arc<Estimator>,
    engine: Arc<dyn ContainerEngine>,
    config: Arc<CoreConfig>,
    inbox: mpsc::Receiver<JobHandle>,
}

impl Dispatcher {
    pub fn new(
        table: Arc<ReplicaTable>,
        estimator: Arc<Estimator>,
        engine: Arc<dyn ContainerEngine>,
        config: Arc<CoreConfig>,
    ) -> (Self, mpsc::Sender<JobHandle>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        (
            Self {
                table,
                estimator,
                engine,
                config,
                inbox: rx,
            },
            tx,
        )
    }

    /// Consume jobs from the inbox until the sender side is dropped. Spawn
    /// this with `tokio::spawn(dispatcher.run())`.
    pub async fn run(mut self) {
        info!("dispatcher started");
        while let Some(job) = self.inbox.recv().await {
            self.dispatch_one(job).await;
        }
        info!("dispatcher inbox closed, shutting down");
    }

    async fn dispatch_one(&self, job: JobHandle) {
        let scan = self.table.scan_time_to_ready();
        // Ties broken by lowest index: `min_by_key` returns the first
        // minimal element when iterating in table order.
        let (i_star, t_star) = scan
            .into_iter()
            .min_by_key(|&(_, t)| t)
            .expect("replica table always has at least the sentinel");

        let e_setup = self.estimator.setup.read();
        let threshold = e_setup
            .checked_sub(self.config.spawn_tolerance)
            .unwrap_or(Duration::ZERO);

        if t_star > threshold {
            info!(
                time_to_ready = ?t_star,
                threshold = ?threshold,
                "spawning new replica for job"
            );
            self.spawn_replica_for(job);
            return;
        }

        let replica = self
            .table
            .get(i_star)
            .expect("index came from a scan of the same table");
        match replica.enqueue(job.clone()) {
            Ok(()) => {
                info!(replica = %replica.name, "enqueued onto existing replica");
            }
            Err(e) => {
                warn!(
                    replica = %replica.name,
                    error = %e,
                    "enqueue onto chosen replica failed, spawning instead"
                );
                self.spawn_replica_for(job);
            }
        }
    }

    fn spawn_replica_for(&self, job: JobHandle) {
        let replica = Arc::new(Replica::new(self.config.queue_capacity));
        self.table.push(replica.clone());
        if let Err(e) = replica.enqueue(job) {
            // A brand-new replica is always `Init`, which `enqueue` never
            // rejects; this branch exists only to surface a future change
            // to that invariant loudly rather than silently drop the job.
            warn!(replica = %replica.name, error = %e, "failed to enqueue onto freshly spawned replica");
        }

        let engine = self.engine.clone();
        let estimator = self.estimator.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            run_replica_lifecycle(replica, engine, estimator, config).await;
        });
    }
}

/// setup -> run -> cleanup, in sequence, for one replica's entire lifetime.
async fn run_replica_lifecycle(
    replica: Arc<Replica>,
    engine: Arc<dyn ContainerEngine>,
    estimator: Arc<Estimator>,
    config: Arc<CoreConfig>,
) {
    replica
        .setup(
            engine.as_ref(),
            &estimator,
            &config.replica_image,
            &config.replica_network,
            config.replica_port,
            config.healthcheck_attempts,
            config.healthcheck_interval,
        )
        .await;

    if replica.status() == crate::replica::ReplicaStatus::Error {
        return;
    }

    replica.run(&estimator, config.replica_port).await;
    replica.cleanup(engine.as_ref()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ContainerHandle, ContainerSpec};
    use crate::job::Job;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Mutex as StdMutex;

    struct NeverReadyEngine;

    #[async_trait::async_trait]
    impl ContainerEngine for NeverReadyEngine {
        async fn create(&self, _spec: &ContainerSpec) -> crate::engine::Result<ContainerHandle> {
            Ok(ContainerHandle { id: "c1".into() })
        }
        async fn start(&self, _id: &str) -> crate::engine::Result<()> {
            Ok(())
        }
        async fn inspect_ip(&self, _id: &str, _network: &str) -> crate::engine::Result<IpAddr> {
            Ok(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)))
        }
        async fn stop(&self, _id: &str) -> crate::engine::Result<()> {
            Ok(())
        }
        async fn remove(&self, _id: &str) -> crate::engine::Result<()> {
            Ok(())
        }
    }

    fn test_config() -> Arc<CoreConfig> {
        Arc::new(CoreConfig {
            job_time_prior: Duration::from_secs(1),
            setup_time_prior: Duration::from_millis(50),
            replica_image: "example/replica".into(),
            replica_network: "test_net".into(),
            state_file: None,
            queue_capacity: 8,
            replica_port: 8000,
            healthcheck_attempts: 1,
            healthcheck_interval: Duration::from_millis(1),
            spawn_tolerance: Duration::from_millis(500),
            persist_interval: Duration::from_secs(10),
        })
    }

    #[tokio::test]
    async fn empty_fleet_spawns_via_the_sentinel_path() {
        // Invariant 5: the dispatcher only spawns when min time_to_ready
        // exceeds E[setup] - tau; against an empty fleet that's trivially
        // true because the sentinel reports Duration::MAX.
        let table = Arc::new(ReplicaTable::new());
        let estimator = Arc::new(Estimator::new(Duration::from_millis(50), Duration::from_secs(1)));
        let engine: Arc<dyn ContainerEngine> = Arc::new(NeverReadyEngine);
        let config = test_config();
        let (dispatcher, tx) = Dispatcher::new(table.clone(), estimator.clone(), engine, config);
        tokio::spawn(dispatcher.run());

        let job = std::sync::Arc::new(StdMutex::new(Job::new("hello".into(), &estimator)));
        tx.send(job).await.unwrap();

        // Give the dispatcher a tick to process and spawn.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(table.scan_time_to_ready().len(), 2, "sentinel + one spawned replica");
    }
}
