//! Tile footprint geometry in raster pixel space.

use super::ImageryError;
use crate::coord::{GeoBounds, PixelCoord, PixelLocator};
use crate::raster::{PixelWindow, RasterError};

/// The four tile corners located in a raster's pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerPixels {
    pub top_left: PixelCoord,
    pub top_right: PixelCoord,
    pub bottom_left: PixelCoord,
    pub bottom_right: PixelCoord,
}

impl CornerPixels {
    /// Locates every corner of `bounds` with `locator`.
    pub fn locate(locator: &PixelLocator, bounds: &GeoBounds) -> Result<Self, RasterError> {
        Ok(Self {
            top_left: locator.locate(bounds.top_left())?,
            top_right: locator.locate(bounds.top_right())?,
            bottom_left: locator.locate(bounds.bottom_left())?,
            bottom_right: locator.locate(bounds.bottom_right())?,
        })
    }

    fn all(&self) -> [PixelCoord; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Rotation of the tile's top edge against the raster's pixel rows, in
    /// degrees. Positive when the top-right corner sits lower than the
    /// top-left one.
    pub fn skew_degrees(&self) -> f64 {
        let dx = (self.top_right.x - self.top_left.x) as f64;
        let dy = (self.top_right.y - self.top_left.y) as f64;
        dy.atan2(dx).to_degrees()
    }

    /// Horizontal offset between the left corners. Width of the wedge the
    /// skew adds on each side of the footprint.
    pub fn horizontal_margin(&self) -> u32 {
        (self.top_left.x - self.bottom_left.x).unsigned_abs() as u32
    }

    /// Axis-aligned bounds of the corners clamped to a `width`×`height`
    /// raster.
    ///
    /// Fails when the clamped window has zero width or height, i.e. the tile
    /// does not overlap the raster.
    pub fn bounding_window(&self, width: u32, height: u32) -> Result<PixelWindow, ImageryError> {
        let corners = self.all();
        let clamp = |v: i64, limit: u32| v.clamp(0, i64::from(limit));

        let x_min = clamp(corners.iter().map(|c| c.x).min().unwrap_or(0), width);
        let x_max = clamp(corners.iter().map(|c| c.x).max().unwrap_or(0), width);
        let y_min = clamp(corners.iter().map(|c| c.y).min().unwrap_or(0), height);
        let y_max = clamp(corners.iter().map(|c| c.y).max().unwrap_or(0), height);

        let window_width = x_max - x_min;
        let window_height = y_max - y_min;
        if window_width <= 0 || window_height <= 0 {
            return Err(ImageryError::EmptyWindow {
                width: window_width,
                height: window_height,
            });
        }

        Ok(PixelWindow::new(
            x_min as u32,
            y_min as u32,
            window_width as u32,
            window_height as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners(tl: (i64, i64), tr: (i64, i64), bl: (i64, i64), br: (i64, i64)) -> CornerPixels {
        CornerPixels {
            top_left: PixelCoord::new(tl.0, tl.1),
            top_right: PixelCoord::new(tr.0, tr.1),
            bottom_left: PixelCoord::new(bl.0, bl.1),
            bottom_right: PixelCoord::new(br.0, br.1),
        }
    }

    #[test]
    fn test_aligned_footprint_has_no_skew() {
        let c = corners((10, 20), (50, 20), (10, 60), (50, 60));
        assert_eq!(c.skew_degrees(), 0.0);
        assert_eq!(c.horizontal_margin(), 0);
    }

    #[test]
    fn test_skew_sign() {
        // Top-right lower than top-left: clockwise in image coordinates
        let c = corners((0, 0), (100, 100), (-100, 100), (0, 200));
        assert!((c.skew_degrees() - 45.0).abs() < 1e-12);

        let c = corners((0, 10), (100, 0), (10, 110), (110, 100));
        assert!(c.skew_degrees() < 0.0);
        assert_eq!(c.horizontal_margin(), 10);
    }

    #[test]
    fn test_bounding_window_inside() {
        let c = corners((12, 20), (50, 18), (10, 60), (48, 58));
        let window = c.bounding_window(100, 100).unwrap();
        assert_eq!(window, PixelWindow::new(10, 18, 40, 42));
    }

    #[test]
    fn test_bounding_window_clamped() {
        let c = corners((-20, -5), (30, -5), (-20, 40), (30, 40));
        let window = c.bounding_window(25, 100).unwrap();
        assert_eq!(window, PixelWindow::new(0, 0, 25, 40));
    }

    #[test]
    fn test_bounding_window_outside_raster_fails() {
        let c = corners((200, 10), (240, 10), (200, 50), (240, 50));
        let result = c.bounding_window(100, 100);
        assert!(matches!(
            result,
            Err(ImageryError::EmptyWindow { width: 0, .. })
        ));
    }

    #[test]
    fn test_bounding_window_degenerate_fails() {
        let c = corners((5, 5), (5, 5), (5, 5), (5, 5));
        assert!(c.bounding_window(100, 100).is_err());
    }
}
