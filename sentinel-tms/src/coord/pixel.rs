//! WGS84 point to raster pixel lookup.

use super::{LonLat, PixelCoord};
use crate::raster::{CrsTransform, GeoTransform, Raster, RasterError, WGS84_EPSG};

/// Maps WGS84 points into the pixel grid of one raster.
///
/// Building the CRS transform is the expensive part, so callers that locate
/// several points in the same raster (e.g. the four tile corners) should build
/// one locator and reuse it.
pub struct PixelLocator {
    transform: CrsTransform,
    geo_transform: GeoTransform,
}

impl PixelLocator {
    /// Creates a locator for the raster's native projection and geotransform.
    pub fn for_raster(raster: &dyn Raster) -> Result<Self, RasterError> {
        Ok(Self {
            transform: CrsTransform::new(WGS84_EPSG, raster.epsg())?,
            geo_transform: raster.geo_transform(),
        })
    }

    /// Reprojects `point` into the raster CRS, converts it to a fractional
    /// pixel offset and rounds half up to the nearest integer pixel.
    pub fn locate(&self, point: LonLat) -> Result<PixelCoord, RasterError> {
        let (x, y) = self.transform.convert(point.lon, point.lat)?;
        let (px, py) = self.geo_transform.world_to_pixel(x, y)?;
        Ok(PixelCoord::new(round_half_up(px), round_half_up(py)))
    }
}

/// Pixel position of a WGS84 point inside `raster`.
///
/// Fails only when the raster's projection cannot be used for transforms.
pub fn pixel_for_lonlat(raster: &dyn Raster, lon: f64, lat: f64) -> Result<PixelCoord, RasterError> {
    PixelLocator::for_raster(raster)?.locate(LonLat::new(lon, lat))
}

#[inline]
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BandArray, GeoTransform};

    struct GeographicRaster;

    impl Raster for GeographicRaster {
        fn width(&self) -> u32 {
            100
        }

        fn height(&self) -> u32 {
            100
        }

        fn geo_transform(&self) -> GeoTransform {
            // quarter degree pixels, upper-left at (0.0, 10.0)
            GeoTransform::new([0.0, 0.25, 0.0, 10.0, 0.0, -0.25])
        }

        fn epsg(&self) -> u32 {
            WGS84_EPSG
        }

        fn read_band(&self) -> Result<BandArray, RasterError> {
            Ok(BandArray::filled(100, 100, 0.0))
        }
    }

    #[test]
    fn test_pixel_in_geographic_raster() {
        let pixel = pixel_for_lonlat(&GeographicRaster, 12.5, -2.5).unwrap();
        assert_eq!(pixel, PixelCoord::new(50, 50));
    }

    #[test]
    fn test_pixel_rounds_half_up() {
        // 0.125 sits exactly half way between pixel 0 and 1
        let pixel = pixel_for_lonlat(&GeographicRaster, 0.125, 9.875).unwrap();
        assert_eq!(pixel, PixelCoord::new(1, 1));

        let pixel = pixel_for_lonlat(&GeographicRaster, 0.1, 9.9).unwrap();
        assert_eq!(pixel, PixelCoord::new(0, 0));
    }

    #[test]
    fn test_pixel_outside_raster_is_not_clamped() {
        let pixel = pixel_for_lonlat(&GeographicRaster, -2.5, 12.5).unwrap();
        assert_eq!(pixel, PixelCoord::new(-10, -10));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(0.49), 0);
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-0.51), -1);
    }
}
