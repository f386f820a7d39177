//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use uuid::Uuid;

use radar_decode::{FrameDecoder, SyntheticConfig, SyntheticDecoder};

use crate::config::ServiceConfig;
use crate::fetch::SourceFetcher;
use crate::jobs::JobCache;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub jobs: Arc<JobCache>,
    pub fetcher: SourceFetcher,
    /// Decode seam; `None` means decode-stage failures until an operator
    /// configures a decoder (or opts into the synthetic one).
    pub decoder: Option<Arc<dyn FrameDecoder>>,
}

impl AppState {
    /// Build the state and the pipeline work queue consumer.
    pub fn new(config: ServiceConfig) -> Result<(Arc<Self>, mpsc::Receiver<Uuid>)> {
        let (jobs, queue_rx) = JobCache::new(config.retention(), config.queue_capacity);
        let fetcher = SourceFetcher::new(config.fetch_timeout())?;

        // Fabricated frames are strictly opt-in; there is no silent
        // fallback when a real decoder is absent.
        let decoder: Option<Arc<dyn FrameDecoder>> = if config.synthetic_decoder {
            Some(Arc::new(SyntheticDecoder::new(SyntheticConfig::default())))
        } else {
            None
        };

        let state = Arc::new(Self {
            config,
            jobs,
            fetcher,
            decoder,
        });

        Ok((state, queue_rx))
    }
}
