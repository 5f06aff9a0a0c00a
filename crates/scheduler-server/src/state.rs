//! Shared server state, threaded through handlers via `axum::Extension`
//! — the same sharing mechanism the teacher uses for its `CoreService`.

use std::sync::Arc;

use scheduler_core::{Estimator, JobRegistry, ReplicaTable};
use tokio::sync::mpsc::Sender;

use scheduler_core::job::JobHandle;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub replicas: Arc<ReplicaTable>,
    pub estimator: Arc<Estimator>,
    pub dispatch: Sender<JobHandle>,
}
