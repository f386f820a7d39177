//! HTTP handlers for the radar processing API.
//!
//! Endpoints:
//! - `POST /api/process-radar` - submit a source URL for processing
//! - `GET /api/data/:job_id` - job status and full result payload
//! - `GET /api/image/:job_id` - rendered overlay PNG
//! - `GET /api/geojson/:job_id` - sampled point collection
//! - `GET /health` - health check
//! - `GET /metrics` - Prometheus metrics

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::jobs::{JobStatus, ResultLookup};
use crate::state::AppState;

/// Request body for /api/process-radar.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// Source URL of the radar product file
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body for /api/process-radar.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub job_id: String,
    pub status: String,
    pub deduped: bool,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub jobs: usize,
}

/// Client-facing status string for a job status.
fn public_status(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending | JobStatus::Processing => "processing",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "error",
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /api/process-radar - submit a source URL
pub async fn process_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ProcessRequest>,
) -> Response {
    let url = match request.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "url is required"),
    };

    counter!("radar_submissions_total").increment(1);

    match state.jobs.submit(&url).await {
        Ok(outcome) => {
            if outcome.deduped {
                counter!("radar_submissions_deduped_total").increment(1);
                info!(job_id = %outcome.job_id, url = %url, "Reusing cached job");
            }

            let message = if outcome.deduped {
                "Job already known for this source".to_string()
            } else {
                "Radar data processing started".to_string()
            };

            Json(ProcessResponse {
                job_id: outcome.job_id.to_string(),
                status: public_status(outcome.status).to_string(),
                deduped: outcome.deduped,
                message,
            })
            .into_response()
        }
        Err(e) => error_response(
            StatusCode::from_u16(e.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            &e.to_string(),
        ),
    }
}

/// GET /api/data/:job_id - job status and result payload
pub async fn data_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Some(job_id) = parse_job_id(&job_id) else {
        return error_response(StatusCode::NOT_FOUND, "Job not found");
    };

    match state.jobs.result(job_id).await {
        ResultLookup::NotFound => error_response(StatusCode::NOT_FOUND, "Job not found"),
        ResultLookup::NotReady => Json(json!({
            "status": "processing",
            "message": "Data is still being processed",
        }))
        .into_response(),
        ResultLookup::Failed(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "error": error,
            })),
        )
            .into_response(),
        ResultLookup::Completed { source_url, result } => Json(json!({
            "status": "completed",
            "data": {
                "geojson": result.geojson,
                "image_info": result.image_info,
                "timestamp": result.completed_at.to_rfc3339(),
                "source_url": source_url,
            },
        }))
        .into_response(),
    }
}

/// GET /api/image/:job_id - rendered overlay PNG
pub async fn image_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Some(job_id) = parse_job_id(&job_id) else {
        return error_response(StatusCode::NOT_FOUND, "Job not found");
    };

    match state.jobs.result(job_id).await {
        ResultLookup::NotFound => error_response(StatusCode::NOT_FOUND, "Job not found"),
        ResultLookup::Completed { result, .. } => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/png")],
            result.image,
        )
            .into_response(),
        _ => error_response(StatusCode::NOT_FOUND, "Data not ready"),
    }
}

/// GET /api/geojson/:job_id - sampled point collection
pub async fn geojson_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let Some(job_id) = parse_job_id(&job_id) else {
        return error_response(StatusCode::NOT_FOUND, "Job not found");
    };

    match state.jobs.result(job_id).await {
        ResultLookup::NotFound => error_response(StatusCode::NOT_FOUND, "Job not found"),
        ResultLookup::Completed { result, .. } => Json(result.geojson).into_response(),
        _ => error_response(StatusCode::NOT_FOUND, "Data not ready"),
    }
}

/// GET /health - health check
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "radar-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.jobs.len().await,
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(
    Extension(prometheus): Extension<PrometheusHandle>,
) -> impl IntoResponse {
    prometheus.render()
}

/// The id namespace is opaque to clients; anything unparseable is simply
/// an unknown job.
fn parse_job_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        .route("/api/process-radar", post(process_handler))
        .route("/api/data/:job_id", get(data_handler))
        .route("/api/image/:job_id", get(image_handler))
        .route("/api/geojson/:job_id", get(geojson_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server.
pub async fn start_server(
    state: Arc<AppState>,
    prometheus: PrometheusHandle,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let app = build_router(state, prometheus);

    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
