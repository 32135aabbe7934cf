//! Deterministic tile file names.
//!
//! The file name is the cache key: it encodes every parameter that changes the
//! produced pixels, so an existing file is always the right answer for a
//! request with identical parameters.
//!
//! ```text
//! {zone}_{YYYYMMDD}_{x}_{y}_{z}_{b1}_{b2}_{b3}_{c1min}_{c1max}_{c2min}_{c2max}_{c3min}_{c3max}.png
//! ```

use chrono::NaiveDate;

use super::{BandTriple, ClipRange};
use crate::coord::TileCoord;

/// Builds the cache file name for a fully resolved request.
///
/// Floats use Rust's shortest round-trip formatting (`2500`, `-5.5`), so two
/// distinct clip values never share a representation.
pub fn tile_file_name(
    zone: &str,
    date: NaiveDate,
    tile: TileCoord,
    bands: &BandTriple,
    clips: &[ClipRange; 3],
) -> String {
    let [b1, b2, b3] = bands.indices();
    format!(
        "{}_{}_{}_{}_{}_{}_{}_{}_{}_{}_{}_{}_{}_{}.png",
        zone,
        date.format("%Y%m%d"),
        tile.x,
        tile.y,
        tile.zoom,
        b1,
        b2,
        b3,
        clips[0].min(),
        clips[0].max(),
        clips[1].min(),
        clips[1].max(),
        clips[2].min(),
        clips[2].max(),
    )
}
