//! Job retention and cleanup background task.
//!
//! Removes terminal jobs older than the retention window on a repeating
//! interval, independent of request traffic, and deletes their artifact
//! directories best-effort.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use metrics::counter;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info, warn};

use crate::jobs::ReapStats;
use crate::state::AppState;

/// Background reaper task.
pub struct ReaperTask {
    state: Arc<AppState>,
}

impl ReaperTask {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run one reaper sweep.
    pub async fn run_once(&self) -> Result<ReapStats> {
        let (removed, stats) = self.state.jobs.reap_expired(Utc::now()).await;

        for job_id in &removed {
            counter!("radar_jobs_reaped_total").increment(1);

            // Artifact cleanup is best-effort; the directory may already
            // be gone or may never have been written.
            let job_dir = self.state.config.data_dir.join(job_id.to_string());
            if let Err(e) = tokio::fs::remove_dir_all(&job_dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(job_id = %job_id, error = %e, "Failed to remove job directory");
                }
            }
        }

        if stats.removed > 0 || stats.kept_in_flight > 0 {
            info!(
                removed = stats.removed,
                kept_in_flight = stats.kept_in_flight,
                "Reaper cycle complete"
            );
        }

        Ok(stats)
    }

    /// Run the reaper in a loop.
    pub async fn run_forever(self) {
        if !self.state.config.reaper_enabled {
            info!("Reaper task disabled");
            return;
        }

        info!(
            interval_secs = self.state.config.reaper_interval_secs,
            retention_hours = self.state.config.retention_hours,
            "Starting reaper background task"
        );

        let mut ticker = interval(TokioDuration::from_secs(
            self.state.config.reaper_interval_secs,
        ));

        // Run immediately on startup
        if let Err(e) = self.run_once().await {
            error!(error = %e, "Reaper cycle failed");
        }

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!(error = %e, "Reaper cycle failed");
            }
        }
    }
}
