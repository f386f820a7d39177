//! Service configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the radar processing service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory for per-job rendered artifacts
    pub data_dir: PathBuf,
    /// Job retention window in hours
    pub retention_hours: u32,
    /// Whether the reaper task is enabled
    pub reaper_enabled: bool,
    /// Seconds between reaper cycles
    pub reaper_interval_secs: u64,
    /// Number of pipeline worker tasks
    pub pipeline_workers: usize,
    /// Work queue capacity (submissions beyond it are rejected)
    pub queue_capacity: usize,
    /// HTTP fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Ceiling for the decode/render/sample stages, in seconds
    pub stage_timeout_secs: u64,
    /// Point sampler stride (every Nth row/column)
    pub sampler_stride: usize,
    /// Opt-in synthetic decoder (demo mode, fabricated frames)
    pub synthetic_decoder: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("processed_data"),
            retention_hours: 24,
            reaper_enabled: true,
            reaper_interval_secs: 3600, // hourly
            pipeline_workers: 4,
            queue_capacity: 64,
            fetch_timeout_secs: 30,
            stage_timeout_secs: 60,
            sampler_stride: 5,
            synthetic_decoder: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            retention_hours: env_parse("RETENTION_HOURS", defaults.retention_hours),
            reaper_enabled: env_flag("ENABLE_REAPER", defaults.reaper_enabled),
            reaper_interval_secs: env_parse("REAPER_INTERVAL_SECS", defaults.reaper_interval_secs),
            pipeline_workers: env_parse("PIPELINE_WORKERS", defaults.pipeline_workers).max(1),
            queue_capacity: env_parse("QUEUE_CAPACITY", defaults.queue_capacity).max(1),
            fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            stage_timeout_secs: env_parse("STAGE_TIMEOUT_SECS", defaults.stage_timeout_secs),
            sampler_stride: env_parse("SAMPLE_STRIDE", defaults.sampler_stride).max(1),
            synthetic_decoder: env_flag("SYNTHETIC_DECODER", false),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours as i64)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}
