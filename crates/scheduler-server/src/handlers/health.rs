//! Liveness and replica-fleet diagnostics. Unconditionally mounted,
//! unauthenticated, mirroring `sem_os_server::handlers::health::health`.

use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Per-replica diagnostic snapshot — not a scheduling primitive, purely
/// operational visibility into the fleet the dispatcher is managing.
pub async fn replicas(Extension(state): Extension<AppState>) -> Json<Value> {
    let rows: Vec<Value> = state
        .replicas
        .snapshot()
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "status": r.status(),
                "time_to_ready_ms": duration_ms(r.time_to_ready()),
            })
        })
        .collect();
    Json(json!({ "replicas": rows }))
}

fn duration_ms(d: std::time::Duration) -> Option<u128> {
    if d == std::time::Duration::MAX {
        None
    } else {
        Some(d.as_millis())
    }
}
