//! `GET /status/:id` — report a job's lifecycle stage.

use axum::extract::{Extension, Path};
use axum::Json;
use scheduler_core::error::SchedulerError;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub async fn status(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| SchedulerError::NotFound(Uuid::nil()))?;
    let handle = state.registry.get(id).ok_or(SchedulerError::NotFound(id))?;
    let status = handle.lock().expect("job mutex poisoned").status;
    Ok(Json(json!({ "status": status.as_wire_str() })))
}
