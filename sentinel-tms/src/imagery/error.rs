//! Error types for tile extraction.

use std::path::PathBuf;

use thiserror::Error;

use crate::raster::RasterError;

/// Errors that can occur while turning band rasters into a tile image.
#[derive(Debug, Error)]
pub enum ImageryError {
    /// Reading or georeferencing a band raster failed.
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// Clip window has `min >= max`.
    #[error("Invalid clip range ({min}, {max}): min must be below max")]
    InvalidClip { min: f64, max: f64 },

    /// Band rasters of one product have different pixel grids.
    #[error(
        "Band size mismatch: expected {}×{}, got {}×{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    BandSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Tile footprint clamps to an empty pixel window.
    #[error("Tile window is empty after clamp ({width}×{height})")]
    EmptyWindow { width: i64, height: i64 },

    /// Deskewed footprint has no square left after removing its margins.
    #[error("Nothing left to crop: {width}×{height} image with a {margin} px margin")]
    EmptyCrop { width: u32, height: u32, margin: u32 },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing the output file failed.
    #[error("Failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_empty_window() {
        let err = ImageryError::EmptyWindow {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Tile window is empty after clamp (0×12)");
    }

    #[test]
    fn test_display_band_size_mismatch() {
        let err = ImageryError::BandSizeMismatch {
            expected: (10980, 10980),
            actual: (5490, 5490),
        };
        assert_eq!(
            err.to_string(),
            "Band size mismatch: expected 10980×10980, got 5490×5490"
        );
    }

    #[test]
    fn test_display_empty_crop() {
        let err = ImageryError::EmptyCrop {
            width: 30,
            height: 20,
            margin: 10,
        };
        assert_eq!(
            err.to_string(),
            "Nothing left to crop: 30×20 image with a 10 px margin"
        );
    }

    #[test]
    fn test_from_image_error() {
        let image_err = image::load_from_memory(b"not a png").unwrap_err();
        let err: ImageryError = image_err.into();
        assert!(matches!(err, ImageryError::Encode(_)));
        assert!(err.to_string().starts_with("PNG encoding failed: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_raster_error() {
        let err: ImageryError = RasterError::DegenerateGeoTransform.into();
        assert!(matches!(err, ImageryError::Raster(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
