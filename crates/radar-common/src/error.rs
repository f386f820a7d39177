//! Error types for radar-overlay services.

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for radar processing operations.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Fetch Errors ===
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    #[error("Fetch timed out after {0}s")]
    FetchTimeout(u64),

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    // === Decode Errors ===
    #[error("Malformed radar file: {0}")]
    MalformedInput(String),

    #[error("Unsupported product: {0}")]
    UnsupportedProduct(String),

    // === Processing Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Point sampling failed: {0}")]
    SampleError(String),

    #[error("Pipeline stage timed out after {0}s")]
    StageTimeout(u64),

    // === Request Errors ===
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("Processing queue is full")]
    QueueFull,

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RadarError {
    /// Get the pipeline stage this error belongs to, for stage-tagged
    /// failure messages on job records.
    pub fn stage(&self) -> &'static str {
        match self {
            RadarError::Unreachable(_)
            | RadarError::FetchTimeout(_)
            | RadarError::HttpStatus(_) => "fetch",

            RadarError::MalformedInput(_) | RadarError::UnsupportedProduct(_) => "decode",

            RadarError::RenderError(_) => "render",
            RadarError::SampleError(_) => "sample",
            RadarError::StageTimeout(_) => "pipeline",

            RadarError::JobNotFound(_) | RadarError::ValidationError(_) => "request",
            RadarError::QueueFull => "queue",
            RadarError::InternalError(_) => "internal",
        }
    }

    /// Format this error as a stage-tagged message for job records.
    pub fn stage_message(&self) -> String {
        format!("{}: {}", self.stage(), self)
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            RadarError::ValidationError(_) => 400,
            RadarError::JobNotFound(_) => 404,
            RadarError::QueueFull => 503,
            RadarError::FetchTimeout(_) | RadarError::StageTimeout(_) => 504,
            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for RadarError {
    fn from(err: std::io::Error) -> Self {
        RadarError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::InternalError(format!("JSON error: {}", err))
    }
}
