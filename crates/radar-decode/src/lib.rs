//! Radar frame decoding seam.
//!
//! Real NEXRAD Level 3 parsing is delegated to whatever implements
//! [`FrameDecoder`]; this crate does not ship a binary-format parser. The
//! only in-tree implementation is [`SyntheticDecoder`], a clearly-labeled
//! demo generator that must be enabled explicitly by configuration.

pub mod synthetic;

use radar_common::{RadarFrame, RadarResult};

pub use synthetic::{SyntheticConfig, SyntheticDecoder};

/// Turns raw product bytes into a decoded radar frame.
///
/// Implementations are synchronous: decoding is CPU-bound work and callers
/// run it on a blocking task. Failures use the decode variants of
/// `RadarError` (`MalformedInput`, `UnsupportedProduct`).
pub trait FrameDecoder: Send + Sync {
    /// Decode one radar product file into a frame.
    fn decode(&self, data: &[u8]) -> RadarResult<RadarFrame>;

    /// Short implementation name for logging.
    fn name(&self) -> &'static str;
}
