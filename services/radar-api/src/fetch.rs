//! Source file fetching over HTTP.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use radar_common::{RadarError, RadarResult};

/// Fetches raw radar product bytes for a source URL.
pub struct SourceFetcher {
    client: Client,
    timeout_secs: u64,
}

impl SourceFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(request_timeout: Duration) -> RadarResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RadarError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs: request_timeout.as_secs(),
        })
    }

    /// Fetch the raw bytes behind a source URL.
    pub async fn fetch(&self, url: &str) -> RadarResult<Bytes> {
        info!(url = %url, "Fetching radar data");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RadarError::HttpStatus(status.as_u16()));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e))?;

        debug!(url = %url, bytes = data.len(), "Fetch complete");
        Ok(data)
    }

    fn map_request_error(&self, err: reqwest::Error) -> RadarError {
        if err.is_timeout() {
            RadarError::FetchTimeout(self.timeout_secs)
        } else if err.is_builder() {
            RadarError::ValidationError(format!("invalid source URL: {}", err))
        } else {
            RadarError::Unreachable(err.to_string())
        }
    }
}
