//! Per-band linear contrast stretch.

use image::GrayImage;
use rayon::prelude::*;

use super::ImageryError;
use crate::raster::BandArray;
use crate::tile::ClipRange;

/// Maps band values into `0..=255` through the clip window.
///
/// Values are clipped to `[min, max]`, shifted by `-min` and scaled by
/// `255 / (max - min)`, then rounded. Values at or below `min` become 0 and
/// values at or above `max` become 255.
pub fn normalize_band(band: &BandArray, clip: &ClipRange) -> Result<GrayImage, ImageryError> {
    let (min, max) = (clip.min(), clip.max());
    if !(min < max) {
        return Err(ImageryError::InvalidClip { min, max });
    }

    let scale = 255.0 / (max - min);
    let data: Vec<u8> = band
        .values()
        .par_iter()
        .map(|&v| stretch(f64::from(v), min, max, scale))
        .collect();
    let samples = data.len() as u32;

    GrayImage::from_raw(band.width(), band.height(), data).ok_or(
        ImageryError::BandSizeMismatch {
            expected: (band.width(), band.height()),
            actual: (samples, 1),
        },
    )
}

#[inline]
fn stretch(value: f64, min: f64, max: f64, scale: f64) -> u8 {
    // NaN (nodata) saturates to 0 in the cast
    ((value.clamp(min, max) - min) * scale).round() as u8
}
