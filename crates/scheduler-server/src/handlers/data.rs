//! `GET /data/:id` — fetch a finished job's input, output, and latency.

use axum::extract::{Extension, Path};
use axum::Json;
use scheduler_core::error::SchedulerError;
use scheduler_core::job::JobStatus;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub async fn data(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| SchedulerError::NotFound(Uuid::nil()))?;
    let handle = state.registry.get(id).ok_or(SchedulerError::NotFound(id))?;
    let job = handle.lock().expect("job mutex poisoned");

    if job.status != JobStatus::Done {
        return Err(SchedulerError::NotFound(id).into());
    }

    Ok(Json(json!({
        "input": job.input,
        "output": job.output,
        "latency": job.latency().map(|d| format!("{d:?}")).unwrap_or_default(),
    })))
}
