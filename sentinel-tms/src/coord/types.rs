//! Coordinate types shared by the tile math and the raster lookups.

/// Minimum zoom level served by default.
pub const MIN_ZOOM: u8 = 9;

/// Maximum zoom level served by default.
pub const MAX_ZOOM: u8 = 14;

/// Tile edge in pixels used by the Web Mercator grid definition.
pub const TILE_SIZE: f64 = 256.0;

/// WGS84 semi-major axis in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A TMS tile address.
///
/// `x` increases eastward. `y` is flipped (`2^z - y - 1`) before conversion
/// to meters, see [`super::bbox_from_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Geographic bounding box of this tile.
    pub fn bounds(&self) -> GeoBounds {
        super::bbox_from_tile(self.x, self.y, self.zoom)
    }
}

/// A WGS84 point, longitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned WGS84 bounding box: `min` is the south-west corner and `max`
/// the north-east corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min: LonLat,
    pub max: LonLat,
}

impl GeoBounds {
    pub fn new(min: LonLat, max: LonLat) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    pub fn height(&self) -> f64 {
        self.max.lat - self.min.lat
    }

    pub fn top_left(&self) -> LonLat {
        LonLat::new(self.min.lon, self.max.lat)
    }

    pub fn top_right(&self) -> LonLat {
        self.max
    }

    pub fn bottom_left(&self) -> LonLat {
        self.min
    }

    pub fn bottom_right(&self) -> LonLat {
        LonLat::new(self.max.lon, self.min.lat)
    }

    /// The four corners in `[top_left, top_right, bottom_left, bottom_right]` order.
    pub fn corners(&self) -> [LonLat; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_left(),
            self.bottom_right(),
        ]
    }
}

/// Integer pixel position inside a raster. May lie outside the raster extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    pub x: i64,
    pub y: i64,
}

impl PixelCoord {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}
