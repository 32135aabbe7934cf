//! Raster access abstraction.
//!
//! The tile pipeline only needs a handful of raster primitives: the pixel
//! grid size, the affine geotransform, the native projection and the band
//! values. These are expressed as the [`Raster`] trait so the pipeline never
//! depends on a particular file format.
//!
//! # Implementors
//!
//! - [`GeoTiffRaster`] - single-band GeoTIFF files (via the `tiff` crate)
//!
//! # Example
//!
//! ```ignore
//! use sentinel_tms::raster::{GeoTiffOpener, RasterOpener};
//!
//! let raster = GeoTiffOpener.open(Path::new("31TCJ_2024_6_1_B04.tif"))?;
//! let band = raster.read_band()?;
//! println!("{}x{} in EPSG:{}", band.width(), band.height(), raster.epsg());
//! ```

mod crs;
mod geotiff;
#[cfg(test)]
pub mod mock;

pub use crs::{CrsTransform, WGS84_EPSG};
pub use geotiff::{GeoTiffOpener, GeoTiffRaster, GEOTIFF_EXTENSIONS};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by raster access and georeferencing.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to open raster {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TIFF decoding failed: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("raster {0} carries no georeferencing tags")]
    MissingGeoreference(PathBuf),

    #[error("raster {0} does not declare an EPSG code")]
    MissingCrs(PathBuf),

    #[error("EPSG:{0} is not in the CRS definitions database")]
    UnsupportedCrs(u32),

    #[error("projection failed: {0}")]
    Projection(String),

    #[error("geotransform is not invertible")]
    DegenerateGeoTransform,

    #[error("band data has {actual} samples, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// An opened raster dataset with a single band of interest.
pub trait Raster: Send {
    /// Raster width in pixels.
    fn width(&self) -> u32;

    /// Raster height in pixels.
    fn height(&self) -> u32;

    /// Affine geotransform mapping pixel offsets to projected coordinates.
    fn geo_transform(&self) -> GeoTransform;

    /// EPSG code of the native projection.
    fn epsg(&self) -> u32;

    /// Reads the band values as a 2-D array.
    fn read_band(&self) -> Result<BandArray, RasterError>;

    /// Reads the band values inside `window`, which must lie inside the
    /// raster. Backends that can decode partially should override this.
    fn read_window(&self, window: PixelWindow) -> Result<BandArray, RasterError> {
        Ok(self.read_band()?.window(window))
    }
}

/// Opens raster files by path.
pub trait RasterOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Raster>, RasterError>;
}

/// GDAL-ordered affine geotransform.
///
/// `[x_origin, pixel_width, row_rotation, y_origin, column_rotation, pixel_height]`
/// such that `X = c[0] + px * c[1] + py * c[2]` and `Y = c[3] + px * c[4] + py * c[5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    coefficients: [f64; 6],
}

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.coefficients
    }

    /// Projected coordinate of a (fractional) pixel offset.
    pub fn pixel_to_world(&self, px: f64, py: f64) -> (f64, f64) {
        let c = &self.coefficients;
        (c[0] + px * c[1] + py * c[2], c[3] + px * c[4] + py * c[5])
    }

    /// Fractional pixel offset of a projected coordinate.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Result<(f64, f64), RasterError> {
        let c = &self.coefficients;
        let det = c[1] * c[5] - c[2] * c[4];
        if det == 0.0 || !det.is_finite() {
            return Err(RasterError::DegenerateGeoTransform);
        }

        let dx = x - c[0];
        let dy = y - c[3];
        let px = (c[5] * dx - c[2] * dy) / det;
        let py = (c[1] * dy - c[4] * dx) / det;
        Ok((px, py))
    }
}

/// A rectangular pixel window inside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelWindow {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Row-major single band values.
#[derive(Debug, Clone, PartialEq)]
pub struct BandArray {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl BandArray {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(RasterError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Copies out a window. The window must lie inside the array.
    pub fn window(&self, window: PixelWindow) -> BandArray {
        debug_assert!(window.x + window.width <= self.width);
        debug_assert!(window.y + window.height <= self.height);

        let mut data = Vec::with_capacity(window.width as usize * window.height as usize);
        for row in window.y..window.y + window.height {
            let start = row as usize * self.width as usize + window.x as usize;
            data.extend_from_slice(&self.data[start..start + window.width as usize]);
        }

        BandArray {
            width: window.width,
            height: window.height,
            data,
        }
    }
}
