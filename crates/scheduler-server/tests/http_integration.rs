//! HTTP-level integration tests for the scheduler's ingress contract.
//!
//! Mirrors `sem_os_server/tests/authoring_http_integration.rs`'s use of
//! `tower::ServiceExt` against an in-process router — no real TCP bind
//! needed for these.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::routing::{get, post};
use axum::Router as MockRouter;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use scheduler_core::engine::ContainerEngine;
use scheduler_core::{CoreConfig, Dispatcher, Estimator, JobRegistry, ReplicaTable};
use scheduler_docker::testing::FakeEngine;
use scheduler_server::router::build_router;
use scheduler_server::state::AppState;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Deserialize)]
struct PredictRequest {
    input: String,
}

#[derive(Serialize)]
struct PredictResponse {
    output: String,
}

async fn ok_handler() -> &'static str {
    "ok"
}

async fn predict_handler(axum::Json(req): axum::Json<PredictRequest>) -> axum::Json<PredictResponse> {
    axum::Json(PredictResponse { output: req.input })
}

async fn spawn_mock_replica() -> SocketAddr {
    let app = MockRouter::new()
        .route("/ok", get(ok_handler))
        .route("/", post(predict_handler));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn test_app(replica_port: u16) -> (MockRouter<()>, Arc<JobRegistry>) {
    let registry = Arc::new(JobRegistry::new());
    let table = Arc::new(ReplicaTable::new());
    let estimator = Arc::new(Estimator::new(
        Duration::from_millis(20),
        Duration::from_millis(20),
    ));
    let engine: Arc<dyn ContainerEngine> =
        Arc::new(FakeEngine::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)));
    let config = Arc::new(CoreConfig {
        job_time_prior: Duration::from_millis(20),
        setup_time_prior: Duration::from_millis(20),
        replica_image: "example/replica".into(),
        replica_network: "test_net".into(),
        state_file: None,
        queue_capacity: 4,
        replica_port,
        healthcheck_attempts: 20,
        healthcheck_interval: Duration::from_millis(5),
        spawn_tolerance: Duration::from_millis(5),
        persist_interval: Duration::from_secs(10),
    });

    let (dispatcher, dispatch_tx) =
        Dispatcher::new(table.clone(), estimator.clone(), engine, config);
    tokio::spawn(dispatcher.run());

    let state = AppState {
        registry: registry.clone(),
        replicas: table,
        estimator,
        dispatch: dispatch_tx,
    };

    (build_router(state), registry)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok_without_any_state() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn push_then_poll_status_and_data_reports_the_finished_job() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/push")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"input":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pushed = body_json(response).await;
    let id = pushed["id"].as_str().unwrap().to_string();

    let mut final_status = String::new();
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/status/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        final_status = json["status"].as_str().unwrap().to_string();
        if final_status == "finished" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(final_status, "finished");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/data/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;
    assert_eq!(data["input"], "hello");
    assert_eq!(data["output"], "hello");
    assert!(data["latency"].as_str().is_some());
}

#[tokio::test]
async fn status_on_unknown_id_is_404() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/status/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn data_before_completion_is_404() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let push_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/push")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"input":"slow"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let pushed = body_json(push_response).await;
    let id = pushed["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/data/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(matches!(
        response.status(),
        StatusCode::NOT_FOUND | StatusCode::OK
    ));
}

#[tokio::test]
async fn get_on_push_is_405() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let response = app
        .oneshot(Request::builder().uri("/push").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn post_on_status_is_405() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/status/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn post_on_data_is_405() {
    let addr = spawn_mock_replica().await;
    let (app, _registry) = test_app(addr.port()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/data/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

/// Boundary behavior: "Queue full (>100 pending) surfaces as a submission
/// error" (spec §8), exercised here against the *dispatcher* inbox rather
/// than a replica's private queue — `crates/scheduler-core`'s own
/// `queue_full_surfaces_as_error` test already covers the latter.
#[tokio::test]
async fn push_returns_503_once_the_dispatcher_inbox_is_full() {
    let addr = spawn_mock_replica().await;
    let registry = Arc::new(JobRegistry::new());
    let table = Arc::new(ReplicaTable::new());
    let estimator = Arc::new(Estimator::new(
        Duration::from_millis(20),
        Duration::from_millis(20),
    ));
    let engine: Arc<dyn ContainerEngine> =
        Arc::new(FakeEngine::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)));
    let config = Arc::new(CoreConfig {
        job_time_prior: Duration::from_millis(20),
        setup_time_prior: Duration::from_millis(20),
        replica_image: "example/replica".into(),
        replica_network: "test_net".into(),
        state_file: None,
        queue_capacity: 1,
        replica_port: addr.port(),
        healthcheck_attempts: 20,
        healthcheck_interval: Duration::from_millis(5),
        spawn_tolerance: Duration::from_millis(5),
        persist_interval: Duration::from_secs(10),
    });

    let (dispatcher, dispatch_tx) =
        Dispatcher::new(table.clone(), estimator.clone(), engine, config);
    // Deliberately never spawn `dispatcher.run()` — nothing drains the
    // inbox, so it fills after one job and the next push must be rejected
    // rather than stall waiting for capacity. Keep `dispatcher` alive so
    // its receiver doesn't close the channel out from under `dispatch_tx`.
    let _dispatcher = dispatcher;

    let state = AppState {
        registry: registry.clone(),
        replicas: table,
        estimator,
        dispatch: dispatch_tx,
    };
    let app = build_router(state);

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/push")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"input":"a"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/push")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"input":"b"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
}
