//! Router construction — mirrors `sem_os_server::router::build_router`'s
//! shape, minus the JWT layer the spec's Non-goals rule out
//! (multi-tenant authentication is explicitly out of scope).

use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/push", post(handlers::push::push))
        .route("/status/:id", get(handlers::status::status))
        .route("/data/:id", get(handlers::data::data))
        .route("/health", get(handlers::health::health))
        .route("/healthz/replicas", get(handlers::health::replicas))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
