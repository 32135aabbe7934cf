//! Tile request model
//!
//! Everything that identifies one requested tile: the parsed options
//! ([`TileOptions`]), the cache-key file name derived from a fully resolved
//! request ([`tile_file_name`]), and the error taxonomy returned to the
//! dispatch layer ([`TileError`], [`ErrorClass`]).

mod cache_key;
mod error;
mod request;

pub use cache_key::tile_file_name;
pub use error::{ErrorClass, TileError};
pub use request::{
    parse_date, BandTriple, ClipRange, TileOptions, DEFAULT_BANDS, DEFAULT_CLIP,
};
