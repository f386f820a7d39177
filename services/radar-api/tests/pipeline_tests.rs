//! End-to-end pipeline tests against a local HTTP fixture server.

use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Router};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

use radar_api::config::ServiceConfig;
use radar_api::jobs::{JobStatus, ResultLookup};
use radar_api::pipeline::run_job;
use radar_api::state::AppState;

/// Serve a fixed response on an ephemeral local port and return its URL.
async fn serve_fixture(status: StatusCode, body: &'static [u8]) -> String {
    let app = Router::new().route("/product", get(move || async move { (status, body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/product", addr)
}

/// Build state for tests. The queue receiver is returned so the work
/// queue stays open; tests drive jobs through `run_job` directly.
fn demo_state(data_dir: &TempDir, synthetic: bool) -> (Arc<AppState>, mpsc::Receiver<Uuid>) {
    let config = ServiceConfig {
        data_dir: data_dir.path().to_path_buf(),
        synthetic_decoder: synthetic,
        fetch_timeout_secs: 5,
        stage_timeout_secs: 30,
        ..ServiceConfig::default()
    };
    AppState::new(config).unwrap()
}

#[tokio::test]
async fn test_pipeline_completes_with_synthetic_decoder() {
    let tmp = TempDir::new().unwrap();
    let (state, _queue_rx) = demo_state(&tmp, true);
    let url = serve_fixture(StatusCode::OK, b"pretend level 3 product").await;

    let outcome = state.jobs.submit(&url).await.unwrap();
    run_job(&state, outcome.job_id).await;

    let snapshot = state.jobs.status(outcome.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert!(snapshot.error.is_none());

    match state.jobs.result(outcome.job_id).await {
        ResultLookup::Completed { source_url, result } => {
            assert_eq!(source_url, url);
            assert!(!result.geojson.features.is_empty());
            assert!(!result.image.is_empty());
            assert_eq!(result.image_info.width, 300);
            assert_eq!(result.image_info.height, 300);

            // the durable artifact exists where image_info points
            let artifact = std::path::Path::new(&result.image_info.image_path);
            assert!(artifact.exists());
            assert!(artifact.starts_with(tmp.path()));
        }
        other => panic!("expected completed result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pipeline_fails_on_http_error() {
    let tmp = TempDir::new().unwrap();
    let (state, _queue_rx) = demo_state(&tmp, true);
    let url = serve_fixture(StatusCode::NOT_FOUND, b"missing").await;

    let outcome = state.jobs.submit(&url).await.unwrap();
    run_job(&state, outcome.job_id).await;

    let snapshot = state.jobs.status(outcome.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    let error = snapshot.error.unwrap();
    assert!(error.starts_with("fetch:"), "error = {}", error);
    assert!(snapshot.result.is_none());
}

#[tokio::test]
async fn test_pipeline_fails_without_configured_decoder() {
    let tmp = TempDir::new().unwrap();
    let (state, _queue_rx) = demo_state(&tmp, false);
    let url = serve_fixture(StatusCode::OK, b"bytes nobody can decode").await;

    let outcome = state.jobs.submit(&url).await.unwrap();
    run_job(&state, outcome.job_id).await;

    let snapshot = state.jobs.status(outcome.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    let error = snapshot.error.unwrap();
    assert!(error.starts_with("decode:"), "error = {}", error);
    assert!(error.contains("SYNTHETIC_DECODER"));
}

#[tokio::test]
async fn test_pipeline_fails_on_empty_body() {
    let tmp = TempDir::new().unwrap();
    let (state, _queue_rx) = demo_state(&tmp, true);
    let url = serve_fixture(StatusCode::OK, b"").await;

    let outcome = state.jobs.submit(&url).await.unwrap();
    run_job(&state, outcome.job_id).await;

    let snapshot = state.jobs.status(outcome.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert!(snapshot.error.unwrap().starts_with("decode:"));
}

#[tokio::test]
async fn test_failure_in_one_job_does_not_affect_another() {
    let tmp = TempDir::new().unwrap();
    let (state, _queue_rx) = demo_state(&tmp, true);

    let good_url = serve_fixture(StatusCode::OK, b"good product").await;
    let bad_url = serve_fixture(StatusCode::BAD_GATEWAY, b"bad").await;

    let good = state.jobs.submit(&good_url).await.unwrap();
    let bad = state.jobs.submit(&bad_url).await.unwrap();

    run_job(&state, bad.job_id).await;
    run_job(&state, good.job_id).await;

    assert_eq!(
        state.jobs.status(bad.job_id).await.unwrap().status,
        JobStatus::Failed
    );
    assert_eq!(
        state.jobs.status(good.job_id).await.unwrap().status,
        JobStatus::Completed
    );
}
