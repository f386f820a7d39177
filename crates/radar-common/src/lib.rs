//! Common types and utilities shared across all radar-overlay crates.

pub mod error;
pub mod frame;

pub use error::{RadarError, RadarResult};
pub use frame::{intensity_percent, normalize_dbz, GeoBounds, RadarFrame, DBZ_MAX, DBZ_MIN};
