//! Job cache: the in-memory job map, source deduplication, and work queue.
//!
//! The cache is the single shared mutable resource of the service. All
//! access (dedup lookup, insert, status transitions, result assignment,
//! removal) goes through one mutex; the lock is never held across I/O.
//! Callers only ever receive copy-out snapshots, so a concurrent pipeline
//! transition can never be observed half-applied.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use radar_common::{GeoBounds, RadarError, RadarResult};
use radar_render::FeatureCollection;

/// Job lifecycle status.
///
/// Transitions are forward-only: `Pending -> Processing -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Placement metadata for a rendered overlay image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    /// Durable path of the PNG artifact
    pub image_path: String,
    /// Corner coordinates as [lon, lat], ordered NW, NE, SE, SW
    pub coordinates: [[f64; 2]; 4],
    /// Geographic extremes of the overlay
    pub bounds: GeoBounds,
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

/// Everything a completed job produced.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub geojson: FeatureCollection,
    pub image_info: ImageInfo,
    /// Raw PNG bytes, served by the image endpoint
    pub image: Bytes,
    pub completed_at: DateTime<Utc>,
}

/// A job record. Owned exclusively by the cache.
#[derive(Debug, Clone)]
struct Job {
    id: Uuid,
    source_url: String,
    status: JobStatus,
    created_at: DateTime<Utc>,
    result: Option<JobResult>,
    error: Option<String>,
}

/// Copy-out view of a job at a point in time.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub source_url: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

impl Job {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            source_url: self.source_url.clone(),
            status: self.status,
            created_at: self.created_at,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Outcome of a submission.
#[derive(Debug, Clone, Copy)]
pub struct SubmitOutcome {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub deduped: bool,
}

/// Result lookup outcome for a job id.
#[derive(Debug, Clone)]
pub enum ResultLookup {
    /// Unknown or reaped job id
    NotFound,
    /// Job is pending or processing
    NotReady,
    /// Job failed with a stage-tagged error
    Failed(String),
    /// Job completed
    Completed {
        source_url: String,
        result: JobResult,
    },
}

struct CacheInner {
    jobs: HashMap<Uuid, Job>,
    /// Source-url identity index for deduplication
    by_source: HashMap<String, Uuid>,
}

/// Statistics from one reaper sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReapStats {
    pub removed: u64,
    pub kept_in_flight: u64,
}

/// The job cache and pipeline work queue.
pub struct JobCache {
    inner: Mutex<CacheInner>,
    queue_tx: mpsc::Sender<Uuid>,
    retention: chrono::Duration,
}

impl JobCache {
    /// Create a cache with the given retention window and work queue
    /// capacity. Returns the consumer end of the queue for the worker pool.
    pub fn new(
        retention: chrono::Duration,
        queue_capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Uuid>) {
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity);
        let cache = Arc::new(Self {
            inner: Mutex::new(CacheInner {
                jobs: HashMap::new(),
                by_source: HashMap::new(),
            }),
            queue_tx,
            retention,
        });
        (cache, queue_rx)
    }

    /// Submit a source URL for processing.
    ///
    /// A non-expired job for the same URL is reused unless it failed: a
    /// `Failed` entry never blocks resubmission. New jobs are queued for
    /// the worker pool; a full queue rejects the submission and leaves no
    /// job behind.
    pub async fn submit(&self, source_url: &str) -> RadarResult<SubmitOutcome> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;

        if let Some(&existing_id) = inner.by_source.get(source_url) {
            if let Some(job) = inner.jobs.get(&existing_id) {
                let expired = now - job.created_at > self.retention;
                if !expired && job.status != JobStatus::Failed {
                    debug!(job_id = %existing_id, url = %source_url, "Reusing existing job");
                    return Ok(SubmitOutcome {
                        job_id: existing_id,
                        status: job.status,
                        deduped: true,
                    });
                }
            }
        }

        let id = Uuid::new_v4();
        inner.jobs.insert(
            id,
            Job {
                id,
                source_url: source_url.to_string(),
                status: JobStatus::Pending,
                created_at: now,
                result: None,
                error: None,
            },
        );
        inner.by_source.insert(source_url.to_string(), id);

        // Reserve a queue slot while the insert is still covered by the
        // lock; try_send never blocks.
        if self.queue_tx.try_send(id).is_err() {
            inner.jobs.remove(&id);
            inner.by_source.remove(source_url);
            return Err(RadarError::QueueFull);
        }

        info!(job_id = %id, url = %source_url, "Job queued");
        Ok(SubmitOutcome {
            job_id: id,
            status: JobStatus::Pending,
            deduped: false,
        })
    }

    /// Snapshot of a job's current state, if it exists.
    pub async fn status(&self, job_id: Uuid) -> Option<JobSnapshot> {
        let inner = self.inner.lock().await;
        inner.jobs.get(&job_id).map(Job::snapshot)
    }

    /// Look up a job's result.
    pub async fn result(&self, job_id: Uuid) -> ResultLookup {
        let inner = self.inner.lock().await;
        let Some(job) = inner.jobs.get(&job_id) else {
            return ResultLookup::NotFound;
        };

        match job.status {
            JobStatus::Pending | JobStatus::Processing => ResultLookup::NotReady,
            JobStatus::Failed => ResultLookup::Failed(
                job.error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            JobStatus::Completed => match &job.result {
                Some(result) => ResultLookup::Completed {
                    source_url: job.source_url.clone(),
                    result: result.clone(),
                },
                // unreachable by construction: result is assigned in the
                // same lock scope as the Completed transition
                None => ResultLookup::NotReady,
            },
        }
    }

    /// Transition `Pending -> Processing` and hand the worker the source
    /// URL. Returns `None` if the job no longer exists or already left
    /// `Pending`.
    pub async fn begin(&self, job_id: Uuid) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let job = inner.jobs.get_mut(&job_id)?;
        if job.status != JobStatus::Pending {
            return None;
        }
        job.status = JobStatus::Processing;
        Some(job.source_url.clone())
    }

    /// Record a completed result. The `Completed` transition and the result
    /// assignment happen in one lock scope, so no reader can observe
    /// `Completed` without a result. A no-op when the job was reaped or is
    /// already terminal.
    pub async fn complete(&self, job_id: Uuid, result: JobResult) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&job_id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Completed;
                job.result = Some(result);
            }
        }
    }

    /// Record a failure. A no-op when the job was reaped or is already
    /// terminal.
    pub async fn fail(&self, job_id: Uuid, error: String) {
        let mut inner = self.inner.lock().await;
        if let Some(job) = inner.jobs.get_mut(&job_id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.error = Some(error);
            }
        }
    }

    /// Remove terminal jobs older than the retention window.
    ///
    /// In-flight jobs (`Pending`/`Processing`) are kept regardless of age
    /// so a running pipeline never writes into a cleared slot. Returns the
    /// removed job ids so callers can clean up side artifacts.
    pub async fn reap_expired(&self, now: DateTime<Utc>) -> (Vec<Uuid>, ReapStats) {
        let mut inner = self.inner.lock().await;
        let mut stats = ReapStats::default();

        let expired: Vec<Uuid> = inner
            .jobs
            .values()
            .filter(|job| now - job.created_at > self.retention)
            .map(|job| job.id)
            .collect();

        let mut removed = Vec::new();
        for id in expired {
            let Some(job) = inner.jobs.get(&id) else {
                continue;
            };
            if !job.status.is_terminal() {
                stats.kept_in_flight += 1;
                continue;
            }

            let source_url = job.source_url.clone();
            inner.jobs.remove(&id);
            if inner.by_source.get(&source_url) == Some(&id) {
                inner.by_source.remove(&source_url);
            }
            removed.push(id);
            stats.removed += 1;
        }

        (removed, stats)
    }

    /// Number of jobs currently held.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.jobs.is_empty()
    }
}
