//! Radar frame to image overlay conversion.

use rayon::prelude::*;
use tracing::debug;

use radar_common::{normalize_dbz, GeoBounds, RadarError, RadarFrame, RadarResult};

use crate::colors::{palette_index, PALETTE};
use crate::png::create_png_indexed;

/// A rendered overlay: PNG bytes plus the geographic placement clients
/// need to drape it on a map.
#[derive(Debug, Clone)]
pub struct Overlay {
    /// Encoded PNG image
    pub png: Vec<u8>,
    /// Geographic extremes of the frame
    pub bounds: GeoBounds,
    /// Corner coordinates as [lon, lat], ordered NW, NE, SE, SW
    pub quad: [[f64; 2]; 4],
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

/// Render a decoded frame into a georeferenced PNG overlay.
///
/// Each grid cell becomes one pixel: reflectivity is normalized to 0-255
/// and mapped through the fixed seven-bucket ramp; masked cells come out
/// fully transparent. The palette is fixed, so pixels are generated as
/// palette indices and encoded as an indexed PNG directly.
pub fn render_overlay(frame: &RadarFrame) -> RadarResult<Overlay> {
    let bounds = frame.bounds();
    if !bounds.is_finite() {
        return Err(RadarError::RenderError(
            "frame has no finite coordinates".to_string(),
        ));
    }

    let indices: Vec<u8> = frame
        .samples()
        .par_iter()
        .map(|&dbz| palette_index(normalize_dbz(dbz)))
        .collect();

    let png = create_png_indexed(frame.width(), frame.height(), &PALETTE, &indices)
        .map_err(RadarError::RenderError)?;

    debug!(
        width = frame.width(),
        height = frame.height(),
        png_bytes = png.len(),
        "Rendered overlay"
    );

    Ok(Overlay {
        png,
        bounds,
        quad: bounds.quad(),
        width: frame.width(),
        height: frame.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_small_frame() {
        let frame = RadarFrame::from_parts(
            2,
            2,
            vec![f32::NAN, 0.0, 35.0, 70.0],
            vec![40.0, 40.0, 39.0, 39.0],
            vec![-87.0, -86.0, -87.0, -86.0],
        )
        .unwrap();

        let overlay = render_overlay(&frame).unwrap();
        assert_eq!(overlay.width, 2);
        assert_eq!(overlay.height, 2);
        assert_eq!(&overlay.png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert_eq!(overlay.quad[0], [-87.0, 40.0]);
    }

    #[test]
    fn test_render_rejects_all_nan_coordinates() {
        let frame = RadarFrame::from_parts(
            2,
            1,
            vec![0.0, 0.0],
            vec![f64::NAN, f64::NAN],
            vec![f64::NAN, f64::NAN],
        )
        .unwrap();

        assert!(matches!(
            render_overlay(&frame),
            Err(RadarError::RenderError(_))
        ));
    }
}
