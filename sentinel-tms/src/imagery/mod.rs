//! Tile extraction from band rasters
//!
//! Turns three band files of one product into the final tile PNG.
//!
//! # Processing steps
//!
//! ```text
//! band rasters ──► corner pixels ──► bounding window (clamped)
//!                  (first band)            │
//!                                          ▼
//!               normalize × 3 ◄── read window × 3
//!                     │
//!                     ▼
//!               stack RGB ──► deskew (-θ) ──► center crop ──► resize ──► PNG
//! ```
//!
//! The window is read before normalizing. Normalization is per pixel, so the
//! result matches stretching the whole band and slicing afterwards.
//!
//! # Example
//!
//! ```ignore
//! use sentinel_tms::imagery::{ExtractionRequest, TileExtractor};
//! use sentinel_tms::raster::GeoTiffOpener;
//!
//! let extractor = TileExtractor::new(Arc::new(GeoTiffOpener), 512);
//! extractor.extract(&ExtractionRequest {
//!     band_paths: [&b04, &b03, &b02],
//!     clips: &[ClipRange::default(); 3],
//!     bounds: tile.bounds(),
//!     output: &output_path,
//! })?;
//! ```

mod deskew;
mod encode;
mod error;
mod geometry;
mod normalize;

pub use deskew::{center_crop, deskew};
pub use encode::{transparent_png, write_tile_png};
pub use error::ImageryError;
pub use geometry::CornerPixels;
pub use normalize::normalize_band;

use std::path::Path;
use std::sync::Arc;

use image::{GrayImage, Rgb, RgbImage};
use tracing::debug;

use crate::coord::{GeoBounds, PixelLocator};
use crate::raster::{PixelWindow, Raster, RasterOpener};
use crate::tile::ClipRange;

/// Default output tile edge in pixels.
pub const DEFAULT_OUTPUT_SIZE: u32 = 512;

/// Inputs of one extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    /// Band files for the red, green and blue output channels.
    pub band_paths: [&'a Path; 3],
    pub clips: &'a [ClipRange; 3],
    pub bounds: GeoBounds,
    pub output: &'a Path,
}

/// Produces tile images from band rasters.
pub struct TileExtractor {
    opener: Arc<dyn RasterOpener>,
    output_size: u32,
}

impl TileExtractor {
    pub fn new(opener: Arc<dyn RasterOpener>, output_size: u32) -> Self {
        Self {
            opener,
            output_size,
        }
    }

    pub fn output_size(&self) -> u32 {
        self.output_size
    }

    /// Runs every extraction step and writes the tile to `request.output`.
    ///
    /// Nothing is written on failure.
    pub fn extract(&self, request: &ExtractionRequest<'_>) -> Result<(), ImageryError> {
        let rasters = [
            self.opener.open(request.band_paths[0])?,
            self.opener.open(request.band_paths[1])?,
            self.opener.open(request.band_paths[2])?,
        ];

        let (width, height) = (rasters[0].width(), rasters[0].height());
        for raster in &rasters[1..] {
            if (raster.width(), raster.height()) != (width, height) {
                return Err(ImageryError::BandSizeMismatch {
                    expected: (width, height),
                    actual: (raster.width(), raster.height()),
                });
            }
        }

        let locator = PixelLocator::for_raster(rasters[0].as_ref())?;
        let corners = CornerPixels::locate(&locator, &request.bounds)?;
        let window = corners.bounding_window(width, height)?;
        let skew = corners.skew_degrees();

        debug!(
            x = window.x,
            y = window.y,
            width = window.width,
            height = window.height,
            skew,
            "Tile window located"
        );

        let channels = [
            read_channel(rasters[0].as_ref(), window, &request.clips[0])?,
            read_channel(rasters[1].as_ref(), window, &request.clips[1])?,
            read_channel(rasters[2].as_ref(), window, &request.clips[2])?,
        ];
        let rgb = stack_channels(&channels);

        let rotated = deskew(&rgb, skew);
        let cropped = center_crop(&rotated, corners.horizontal_margin())?;
        write_tile_png(&cropped, self.output_size, request.output)
    }
}

fn read_channel(
    raster: &dyn Raster,
    window: PixelWindow,
    clip: &ClipRange,
) -> Result<GrayImage, ImageryError> {
    let band = raster.read_window(window)?;
    normalize_band(&band, clip)
}

/// Stacks three equally sized channels into an RGB image.
fn stack_channels(channels: &[GrayImage; 3]) -> RgbImage {
    let (width, height) = channels[0].dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y).0[0],
            channels[1].get_pixel(x, y).0[0],
            channels[2].get_pixel(x, y).0[0],
        ])
    })
}
