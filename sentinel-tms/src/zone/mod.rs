//! Imagery zone lookup
//!
//! Sentinel-2 products are cut into named zones (MGRS grid squares such as
//! `31TCJ`), each with its own native UTM projection. A tile can only be
//! produced from one zone, so every request starts by resolving which zone
//! contains the tile corners.
//!
//! # Architecture
//!
//! ```text
//! zones.geojson ──► load_zones_geojson ──► Vec<Zone> ──► ZoneIndex
//!                                                          │
//!                        find_zone(lon, lat) ◄─────────────┘
//!                        3×3 neighbourhood of integer-degree cells,
//!                        exact point-in-polygon per candidate
//! ```
//!
//! Zones are bucketed by the integer-degree cell of their south-west bound.
//! Because zones are not grid aligned, a point may fall in a zone filed under
//! a neighbouring cell, which is why the lookup scans the 3×3 neighbourhood.

mod index;
mod loader;

pub use index::{Zone, ZoneIndex};
pub use loader::load_zones_geojson;

use std::path::PathBuf;

use thiserror::Error;

/// Default GeoJSON feature property holding the zone name.
pub const DEFAULT_NAME_PROPERTY: &str = "Name";

/// Errors raised while loading zone geometry.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("failed to read zone file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid GeoJSON in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("zone file {0} contains no usable zone polygons")]
    Empty(PathBuf),
}
