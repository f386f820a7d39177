//! Synthetic radar frame generator for demo and test use.
//!
//! Produces a Gaussian reflectivity cell with additive noise instead of
//! decoding the input bytes. Output is fabricated: the decoder logs a
//! warning when constructed and must never be wired in as a silent
//! fallback for a real parser.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use radar_common::{RadarError, RadarFrame, RadarResult, DBZ_MAX, DBZ_MIN};

use crate::FrameDecoder;

/// Configuration for the synthetic frame generator.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Grid size (frames are square)
    pub size: usize,
    /// Center latitude of the fabricated scan
    pub center_lat: f64,
    /// Center longitude of the fabricated scan
    pub center_lon: f64,
    /// Noise standard deviation in dBZ
    pub noise_sigma: f32,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            size: 300,
            // Indianapolis, the demo site
            center_lat: 39.7817,
            center_lon: -86.1478,
            noise_sigma: 5.0,
            seed: None,
        }
    }
}

/// Fabricates radar frames with a Gaussian storm cell plus noise.
pub struct SyntheticDecoder {
    config: SyntheticConfig,
}

impl SyntheticDecoder {
    pub fn new(config: SyntheticConfig) -> Self {
        warn!(
            size = config.size,
            center_lat = config.center_lat,
            center_lon = config.center_lon,
            "Synthetic decoder enabled: all decoded frames are fabricated demo data"
        );
        Self { config }
    }
}

impl FrameDecoder for SyntheticDecoder {
    fn decode(&self, data: &[u8]) -> RadarResult<RadarFrame> {
        if data.is_empty() {
            return Err(RadarError::MalformedInput(
                "empty product file".to_string(),
            ));
        }

        let size = self.config.size;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut reflectivity = Vec::with_capacity(size * size);
        let mut latitude = Vec::with_capacity(size * size);
        let mut longitude = Vec::with_capacity(size * size);

        // Gaussian cell over x,y in [-2, 2]: 30 * exp(-(x^2 + y^2)),
        // then additive noise, clamped to the displayable dBZ range.
        for row in 0..size {
            let y = -2.0 + 4.0 * row as f64 / (size - 1) as f64;
            for col in 0..size {
                let x = -2.0 + 4.0 * col as f64 / (size - 1) as f64;

                let signal = 30.0 * (-(x * x + y * y)).exp() as f32;
                let noise = gaussian_noise(&mut rng) * self.config.noise_sigma;
                let dbz = (signal + noise).clamp(DBZ_MIN, DBZ_MAX);
                reflectivity.push(dbz);

                latitude.push(self.config.center_lat + y * 0.5);
                longitude.push(self.config.center_lon + x * 0.5);
            }
        }

        debug!(
            bytes = data.len(),
            size = size,
            "Generated synthetic frame (input bytes ignored)"
        );

        RadarFrame::from_parts(size, size, reflectivity, latitude, longitude)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

/// Standard normal sample via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(size: usize) -> SyntheticDecoder {
        SyntheticDecoder::new(SyntheticConfig {
            size,
            seed: Some(42),
            ..SyntheticConfig::default()
        })
    }

    #[test]
    fn test_rejects_empty_input() {
        let decoder = seeded(50);
        let result = decoder.decode(&[]);
        assert!(matches!(result, Err(RadarError::MalformedInput(_))));
    }

    #[test]
    fn test_frame_dimensions_and_range() {
        let decoder = seeded(50);
        let frame = decoder.decode(b"fake level 3 bytes").unwrap();
        assert_eq!(frame.width(), 50);
        assert_eq!(frame.height(), 50);
        for &dbz in frame.samples() {
            assert!(dbz >= DBZ_MIN && dbz <= DBZ_MAX);
        }
    }

    #[test]
    fn test_seeded_output_is_deterministic() {
        let a = seeded(40).decode(b"x").unwrap();
        let b = seeded(40).decode(b"x").unwrap();
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn test_peak_sits_at_grid_center() {
        let decoder = seeded(51);
        let frame = decoder.decode(b"x").unwrap();

        // The Gaussian cell peaks at ~30 dBZ in the center; with sigma=5
        // noise the center should still clearly exceed the corners.
        let center = frame.value(25, 25);
        let corner = frame.value(0, 0);
        assert!(center > 10.0, "center = {}", center);
        assert!(center > corner, "center = {}, corner = {}", center, corner);
    }

    #[test]
    fn test_coordinates_span_one_degree_box() {
        let decoder = seeded(50);
        let frame = decoder.decode(b"x").unwrap();
        let bounds = frame.bounds();

        // lat/lon = center +/- 1.0 (x,y in [-2,2] scaled by 0.5)
        assert!((bounds.north - 40.7817).abs() < 1e-6);
        assert!((bounds.south - 38.7817).abs() < 1e-6);
        assert!((bounds.east - -85.1478).abs() < 1e-6);
        assert!((bounds.west - -87.1478).abs() < 1e-6);
    }
}
