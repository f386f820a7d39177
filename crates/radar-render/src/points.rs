//! GeoJSON point sampling of radar frames.
//!
//! Strides over the frame grid and emits a sparse FeatureCollection of
//! geolocated reflectivity points, suitable for vector-layer display.

use serde::{Deserialize, Serialize};

use radar_common::{intensity_percent, RadarError, RadarFrame, RadarResult, DBZ_MIN};

/// Configuration for the point sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Take every Nth row and column
    pub stride: usize,
    /// Skip cells at or below this reflectivity (dBZ)
    pub min_dbz: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stride: 5,
            min_dbz: DBZ_MIN,
        }
    }
}

/// A GeoJSON FeatureCollection of sampled radar points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of point features.
    pub features: Vec<PointFeature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A single sampled radar point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointFeature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Point geometry of this feature.
    pub geometry: Geometry,

    /// Reflectivity properties at the sampled cell.
    pub properties: PointProperties,
}

impl PointFeature {
    fn new(lon: f64, lat: f64, reflectivity: f32) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry: Geometry::Point {
                coordinates: [lon, lat],
            },
            properties: PointProperties {
                reflectivity: reflectivity as f64,
                intensity: intensity_percent(reflectivity),
            },
        }
    }
}

/// GeoJSON geometry for sampled points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry.
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },
}

/// Properties attached to each sampled point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointProperties {
    /// Reflectivity in dBZ
    pub reflectivity: f64,
    /// Reflectivity scaled to 0-100
    pub intensity: u8,
}

/// Stride over the frame grid and collect geolocated intensity points.
///
/// NaN cells and cells at or below `min_dbz` are skipped.
pub fn sample_points(frame: &RadarFrame, config: &SamplerConfig) -> RadarResult<FeatureCollection> {
    if config.stride == 0 {
        return Err(RadarError::SampleError("stride must be > 0".to_string()));
    }

    let mut collection = FeatureCollection::new();

    for row in (0..frame.height()).step_by(config.stride) {
        for col in (0..frame.width()).step_by(config.stride) {
            let dbz = frame.value(row, col);
            if dbz.is_nan() || dbz <= config.min_dbz {
                continue;
            }

            let lon = frame.longitude(row, col);
            let lat = frame.latitude(row, col);
            if lon.is_nan() || lat.is_nan() {
                continue;
            }

            collection.features.push(PointFeature::new(lon, lat, dbz));
        }
    }

    Ok(collection)
}
