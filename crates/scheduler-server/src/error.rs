//! Maps `SchedulerError` to HTTP status codes and JSON error bodies.
//! Directly modeled on `sem_os_server::error::AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scheduler_core::error::SchedulerError;
use serde_json::json;

pub struct AppError(SchedulerError);

impl From<SchedulerError> for AppError {
    fn from(e: SchedulerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SchedulerError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            SchedulerError::ReplicaUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SchedulerError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SchedulerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "error": self.0.to_string(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
