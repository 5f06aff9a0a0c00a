//! `POST /push` — accept a prediction job and hand it to the dispatcher.

use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::Json;
use scheduler_core::error::SchedulerError;
use scheduler_core::job::Job;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub id: String,
}

/// A malformed or unparseable body is reported as an internal error, per
/// the original scheduler's disposition — not a 400, since the caller's
/// intent can't be distinguished from a transport-level corruption here.
pub async fn push(
    Extension(state): Extension<AppState>,
    body: Result<Json<PushRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = body.map_err(|e| SchedulerError::Internal(anyhow::anyhow!(e.to_string())))?;

    let job = Job::new(req.input, &state.estimator);
    let id = job.id;
    let handle = state.registry.push(job);

    use tokio::sync::mpsc::error::TrySendError;
    state.dispatch.try_send(handle).map_err(|e| match e {
        TrySendError::Full(_) => SchedulerError::QueueFull,
        TrySendError::Closed(_) => {
            SchedulerError::Internal(anyhow::anyhow!("dispatcher inbox closed"))
        }
    })?;

    Ok(Json(serde_json::to_value(PushResponse { id: id.to_string() }).unwrap()))
}
