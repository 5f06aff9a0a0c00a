//! An in-memory `ContainerEngine`, for tests that need a believable fleet
//! without a real Docker daemon. Mirrors the teacher's `MemoryStore` next
//! to `PostgresProcessStore`: same trait, no I/O.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use scheduler_core::engine::{ContainerEngine, ContainerHandle, ContainerSpec, Result};

/// Every container "created" by this engine resolves to the same address
/// — the address of whatever mock replica HTTP server the test started.
pub struct FakeEngine {
    address: IpAddr,
    next_id: AtomicU64,
    live: Mutex<HashMap<String, ContainerSpec>>,
}

impl FakeEngine {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            next_id: AtomicU64::new(0),
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().expect("fake engine mutex poisoned").len()
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("fake-{n}");
        self.live
            .lock()
            .expect("fake engine mutex poisoned")
            .insert(id.clone(), spec.clone());
        Ok(ContainerHandle { id })
    }

    async fn start(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn inspect_ip(&self, _id: &str, _network: &str) -> Result<IpAddr> {
        Ok(self.address)
    }

    async fn stop(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.live.lock().expect("fake engine mutex poisoned").remove(id);
        Ok(())
    }
}
