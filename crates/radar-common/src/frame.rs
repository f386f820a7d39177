//! Decoded radar frame representation.
//!
//! A frame is one radar scan as a row-major grid of reflectivity samples
//! with per-cell geographic coordinates. Reflectivity is in dBZ; the valid
//! range for display purposes is [-10, 70] dBZ and everything outside it
//! (or NaN) is treated as no-data.

use serde::{Deserialize, Serialize};

use crate::error::{RadarError, RadarResult};

/// Minimum displayable reflectivity (dBZ).
pub const DBZ_MIN: f32 = -10.0;

/// Maximum displayable reflectivity (dBZ).
pub const DBZ_MAX: f32 = 70.0;

/// One decoded radar scan: a grid of geolocated reflectivity samples.
#[derive(Debug, Clone)]
pub struct RadarFrame {
    width: usize,
    height: usize,
    /// Reflectivity in dBZ, row-major
    reflectivity: Vec<f32>,
    /// Per-cell latitude in degrees, row-major
    latitude: Vec<f64>,
    /// Per-cell longitude in degrees, row-major
    longitude: Vec<f64>,
}

impl RadarFrame {
    /// Build a frame from row-major sample arrays.
    ///
    /// All three arrays must hold exactly `width * height` values.
    pub fn from_parts(
        width: usize,
        height: usize,
        reflectivity: Vec<f32>,
        latitude: Vec<f64>,
        longitude: Vec<f64>,
    ) -> RadarResult<Self> {
        let expected = width * height;
        if width == 0 || height == 0 {
            return Err(RadarError::MalformedInput("empty grid".to_string()));
        }
        if reflectivity.len() != expected
            || latitude.len() != expected
            || longitude.len() != expected
        {
            return Err(RadarError::MalformedInput(format!(
                "grid size mismatch: expected {} samples for {}x{}, got {}/{}/{}",
                expected,
                width,
                height,
                reflectivity.len(),
                latitude.len(),
                longitude.len()
            )));
        }

        Ok(Self {
            width,
            height,
            reflectivity,
            latitude,
            longitude,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reflectivity at (row, col) in dBZ.
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.reflectivity[row * self.width + col]
    }

    pub fn latitude(&self, row: usize, col: usize) -> f64 {
        self.latitude[row * self.width + col]
    }

    pub fn longitude(&self, row: usize, col: usize) -> f64 {
        self.longitude[row * self.width + col]
    }

    /// Raw reflectivity samples, row-major.
    pub fn samples(&self) -> &[f32] {
        &self.reflectivity
    }

    /// Geographic extremes of the frame, ignoring NaN coordinates.
    pub fn bounds(&self) -> GeoBounds {
        let mut bounds = GeoBounds {
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
        };

        for &lat in &self.latitude {
            if lat.is_nan() {
                continue;
            }
            bounds.north = bounds.north.max(lat);
            bounds.south = bounds.south.min(lat);
        }
        for &lon in &self.longitude {
            if lon.is_nan() {
                continue;
            }
            bounds.east = bounds.east.max(lon);
            bounds.west = bounds.west.min(lon);
        }

        bounds
    }
}

/// Normalize reflectivity to a 0-255 display intensity.
///
/// Returns `None` for NaN and values outside [-10, 70] dBZ (no-data mask).
pub fn normalize_dbz(dbz: f32) -> Option<u8> {
    if dbz.is_nan() || dbz < DBZ_MIN || dbz > DBZ_MAX {
        return None;
    }
    let scaled = (dbz - DBZ_MIN) / (DBZ_MAX - DBZ_MIN) * 255.0;
    Some(scaled.clamp(0.0, 255.0) as u8)
}

/// Scale reflectivity to a 0-100 intensity for point properties.
pub fn intensity_percent(dbz: f32) -> u8 {
    let scaled = (dbz - DBZ_MIN) / (DBZ_MAX - DBZ_MIN) * 100.0;
    scaled.clamp(0.0, 100.0) as u8
}

/// Geographic bounds of a rendered overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Corner coordinates as [lon, lat] pairs, ordered NW, NE, SE, SW.
    ///
    /// This is the corner order map clients expect for image overlays.
    pub fn quad(&self) -> [[f64; 2]; 4] {
        [
            [self.west, self.north],
            [self.east, self.north],
            [self.east, self.south],
            [self.west, self.south],
        ]
    }

    /// True when every edge holds a finite coordinate.
    pub fn is_finite(&self) -> bool {
        self.north.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.west.is_finite()
    }
}
