//! Background processing pipeline: a bounded worker pool draining the job
//! queue through fetch -> decode -> render/sample.
//!
//! Workers never touch the job map during stage work; only the before/after
//! transitions take the cache lock. A panic inside one job's pipeline is
//! caught and recorded as that job's failure.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::FutureExt;
use metrics::counter;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use radar_common::{RadarError, RadarResult};
use radar_decode::FrameDecoder;
use radar_render::{render_overlay, sample_points, FeatureCollection, Overlay, SamplerConfig};

use crate::jobs::{ImageInfo, JobResult};
use crate::state::AppState;

/// Spawn the worker pool consuming the job queue.
pub fn spawn_workers(state: Arc<AppState>, queue_rx: mpsc::Receiver<Uuid>) {
    let queue_rx = Arc::new(Mutex::new(queue_rx));
    let worker_count = state.config.pipeline_workers;

    info!(workers = worker_count, "Starting pipeline worker pool");

    for worker in 0..worker_count {
        let state = state.clone();
        let queue_rx = queue_rx.clone();

        tokio::spawn(async move {
            loop {
                let job_id = { queue_rx.lock().await.recv().await };
                let Some(job_id) = job_id else {
                    info!(worker = worker, "Job queue closed, worker exiting");
                    break;
                };
                run_job(&state, job_id).await;
            }
        });
    }
}

/// Run one job to a terminal state.
pub async fn run_job(state: &Arc<AppState>, job_id: Uuid) {
    let Some(source_url) = state.jobs.begin(job_id).await else {
        // reaped or already picked up; nothing to do
        warn!(job_id = %job_id, "Queued job no longer pending, skipping");
        return;
    };

    info!(job_id = %job_id, url = %source_url, "Starting radar processing");
    counter!("radar_jobs_started_total").increment(1);

    let outcome = AssertUnwindSafe(process(state, job_id, &source_url))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(result)) => {
            info!(
                job_id = %job_id,
                points = result.geojson.features.len(),
                png_bytes = result.image.len(),
                "Radar processing completed"
            );
            counter!("radar_jobs_completed_total").increment(1);
            state.jobs.complete(job_id, result).await;
        }
        Ok(Err(err)) => {
            error!(job_id = %job_id, stage = err.stage(), error = %err, "Radar processing failed");
            counter!("radar_jobs_failed_total", "stage" => err.stage()).increment(1);
            state.jobs.fail(job_id, err.stage_message()).await;
        }
        Err(_) => {
            error!(job_id = %job_id, "Radar processing panicked");
            counter!("radar_jobs_failed_total", "stage" => "panic").increment(1);
            state
                .jobs
                .fail(job_id, "pipeline: processing task panicked".to_string())
                .await;
        }
    }
}

/// The stage sequence for one job.
async fn process(state: &Arc<AppState>, job_id: Uuid, source_url: &str) -> RadarResult<JobResult> {
    let data = state.fetcher.fetch(source_url).await?;

    let decoder = state.decoder.clone().ok_or_else(|| {
        RadarError::UnsupportedProduct(
            "no Level 3 decoder is configured; set SYNTHETIC_DECODER=1 to enable the \
             synthetic frame generator for demos"
                .to_string(),
        )
    })?;

    let sampler = SamplerConfig {
        stride: state.config.sampler_stride,
        ..SamplerConfig::default()
    };
    let (overlay, geojson) =
        run_cpu_stages(decoder, data, sampler, state.config.stage_timeout_secs).await?;

    // Durable side artifact, addressed by job id
    let job_dir = state.config.data_dir.join(job_id.to_string());
    tokio::fs::create_dir_all(&job_dir)
        .await
        .map_err(|e| RadarError::RenderError(format!("failed to create job directory: {}", e)))?;
    let image_path = job_dir.join("overlay.png");
    tokio::fs::write(&image_path, &overlay.png)
        .await
        .map_err(|e| RadarError::RenderError(format!("failed to write overlay image: {}", e)))?;

    Ok(JobResult {
        geojson,
        image_info: ImageInfo {
            image_path: image_path.display().to_string(),
            coordinates: overlay.quad,
            bounds: overlay.bounds,
            width: overlay.width,
            height: overlay.height,
        },
        image: Bytes::from(overlay.png),
        completed_at: Utc::now(),
    })
}

/// Decode, render and sample on a blocking task under the stage ceiling.
async fn run_cpu_stages(
    decoder: Arc<dyn FrameDecoder>,
    data: Bytes,
    sampler: SamplerConfig,
    timeout_secs: u64,
) -> RadarResult<(Overlay, FeatureCollection)> {
    let handle = tokio::task::spawn_blocking(move || -> RadarResult<_> {
        let frame = decoder.decode(&data)?;
        // render and sample have no ordering dependency; either failing
        // fails the job at its own stage
        let overlay = render_overlay(&frame)?;
        let points = sample_points(&frame, &sampler)?;
        Ok((overlay, points))
    });

    match tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(RadarError::InternalError("processing task panicked".to_string()))
        }
        Ok(Err(join_err)) => Err(RadarError::InternalError(join_err.to_string())),
        Err(_) => Err(RadarError::StageTimeout(timeout_secs)),
    }
}
