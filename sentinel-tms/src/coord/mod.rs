//! Coordinate conversion module
//!
//! Converts TMS tile indices to WGS84 bounding boxes and WGS84 points to
//! pixel positions inside a georeferenced raster.

mod pixel;
mod types;

pub use pixel::{pixel_for_lonlat, PixelLocator};
pub use types::{
    GeoBounds, LonLat, PixelCoord, TileCoord, EARTH_RADIUS, MAX_ZOOM, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Converts a TMS tile index to its WGS84 bounding box.
///
/// Standard Web Mercator tile-to-degrees conversion with a 256 pixel tile and
/// origin shift `π·R`. The row is flipped (`y' = 2^z - y - 1`) before being
/// converted to meters.
///
/// # Returns
///
/// `GeoBounds` with `min = (lon_min, lat_min)` and `max = (lon_max, lat_max)`.
#[inline]
pub fn bbox_from_tile(x: u32, y: u32, zoom: u8) -> GeoBounds {
    let origin = PI * EARTH_RADIUS;
    let zoom_zero_resolution = 2.0 * origin / TILE_SIZE;
    let meters_per_pixel = zoom_zero_resolution / 2.0_f64.powi(zoom as i32);

    let flipped_y = (1_i64 << zoom) - y as i64 - 1;

    let index_to_meters = |index: f64| meters_per_pixel * (index * TILE_SIZE) - origin;

    let x_min = index_to_meters(x as f64);
    let y_min = index_to_meters(flipped_y as f64);
    let x_max = index_to_meters(x as f64 + 1.0);
    let y_max = index_to_meters(flipped_y as f64 + 1.0);

    GeoBounds::new(
        meters_to_lon_lat(x_min, y_min, origin),
        meters_to_lon_lat(x_max, y_max, origin),
    )
}

/// Inverse spherical Mercator for a point in meters.
#[inline]
fn meters_to_lon_lat(x: f64, y: f64, origin: f64) -> LonLat {
    let lon = (x / origin) * 180.0;
    let lat = (y / origin) * 180.0;
    let lat = 180.0 / PI * (2.0 * (lat * PI / 180.0).exp().atan() - PI / 2.0);
    LonLat::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_toulouse_tile_at_zoom_15() {
        let bounds = bbox_from_tile(16540, 11963, 15);

        assert_close(bounds.min.lon, 1.713_867_187_5);
        assert_close(bounds.min.lat, 43.612_216_768_175_73);
        assert_close(bounds.max.lon, 1.724_853_515_625);
        assert_close(bounds.max.lat, 43.620_170_616_189_9);
    }

    #[test]
    fn test_first_tile_at_zoom_9_is_north_west() {
        let bounds = bbox_from_tile(0, 0, 9);

        assert_close(bounds.min.lon, -180.0);
        assert!(bounds.max.lat > 85.0, "row 0 flips to the northern edge");
        assert!(bounds.max.lat <= 85.0511287799);
    }

    #[test]
    fn test_adjacent_tiles_share_edges() {
        let left = bbox_from_tile(8270, 5981, 14);
        let right = bbox_from_tile(8271, 5981, 14);
        assert_close(left.max.lon, right.min.lon);

        let upper = bbox_from_tile(8270, 5981, 14);
        let lower = bbox_from_tile(8270, 5982, 14);
        assert_close(upper.min.lat, lower.max.lat);
    }

    #[test]
    fn test_tile_coord_bounds_delegates() {
        let tile = TileCoord::new(8270, 5981, 14);
        assert_eq!(tile.bounds(), bbox_from_tile(8270, 5981, 14));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_bounds_are_ordered(
                x_raw in 0u32..16384,
                y_raw in 0u32..16384,
                zoom in MIN_ZOOM..=MAX_ZOOM
            ) {
                let max = 1u32 << zoom;
                let bounds = bbox_from_tile(x_raw % max, y_raw % max, zoom);

                prop_assert!(bounds.min.lon < bounds.max.lon);
                prop_assert!(bounds.min.lat < bounds.max.lat);
            }

            #[test]
            fn test_next_zoom_halves_extent(
                x_raw in 0u32..16384,
                y_raw in 0u32..16384,
                zoom in MIN_ZOOM..MAX_ZOOM
            ) {
                let max = 1u32 << zoom;
                let (x, y) = (x_raw % max, y_raw % max);

                let parent = bbox_from_tile(x, y, zoom);
                let child = bbox_from_tile(x * 2, y * 2, zoom + 1);

                let width_ratio = child.width() / parent.width();
                prop_assert!((width_ratio - 0.5).abs() < 1e-9);

                // Mercator stretches latitude, so the halving is only approximate
                let height_ratio = child.height() / parent.height();
                prop_assert!(
                    (height_ratio - 0.5).abs() < 0.05,
                    "height ratio {} at zoom {}", height_ratio, zoom
                );
            }

            #[test]
            fn test_bounds_in_mercator_range(
                x_raw in 0u32..16384,
                y_raw in 0u32..16384,
                zoom in MIN_ZOOM..=MAX_ZOOM
            ) {
                let max = 1u32 << zoom;
                let bounds = bbox_from_tile(x_raw % max, y_raw % max, zoom);

                prop_assert!(bounds.min.lon >= -180.0 - 1e-9);
                prop_assert!(bounds.max.lon <= 180.0 + 1e-9);
                prop_assert!(bounds.min.lat >= -85.06 && bounds.max.lat <= 85.06);
            }
        }
    }
}
