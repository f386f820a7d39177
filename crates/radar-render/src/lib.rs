//! Overlay rendering and point sampling for decoded radar frames.
//!
//! Converts a [`radar_common::RadarFrame`] into the two products map
//! clients consume:
//! - a georeferenced PNG overlay ([`overlay::render_overlay`])
//! - a sparse GeoJSON point collection ([`points::sample_points`])

pub mod colors;
pub mod overlay;
pub mod png;
pub mod points;

pub use colors::{palette_index, reflectivity_color, Color, PALETTE};
pub use overlay::{render_overlay, Overlay};
pub use points::{sample_points, FeatureCollection, PointFeature, SamplerConfig};
