//! Provider trait and error types

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::tile::BandTriple;

/// Local band file per band index.
pub type BandPaths = HashMap<u8, PathBuf>;

/// Errors raised by product providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Zone name cannot be mapped to the object-store layout.
    #[error("Invalid zone name '{0}'")]
    InvalidZone(String),

    /// HTTP transport or status failure.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Writing a downloaded band to the local cache failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The provider returned no file for a requested band.
    #[error("Band B{band:02} missing from product {zone} {date}")]
    MissingBand {
        zone: String,
        date: NaiveDate,
        band: u8,
    },
}

/// Source of satellite products for a zone.
///
/// Implementations perform blocking I/O and are called from blocking worker
/// threads, never directly on the async runtime.
pub trait ProductProvider: Send + Sync {
    /// Most recent date with imagery available for `zone`, or `None` when no
    /// date is found.
    fn last_available_date(&self, zone: &str) -> Option<NaiveDate>;

    /// Makes the requested bands of the `(zone, date)` product available
    /// locally and returns their file paths keyed by band index.
    ///
    /// Fails as a whole if any single band cannot be provided.
    fn find_product_in_zone(
        &self,
        zone: &str,
        date: NaiveDate,
        bands: &BandTriple,
    ) -> Result<BandPaths, ProviderError>;
}
