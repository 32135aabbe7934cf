//! Satellite product provider abstraction
//!
//! A product provider turns `(zone, date, bands)` into local band files that
//! the extraction stage can open. It also answers which date is the most
//! recent one with imagery for a zone.
//!
//! # Implementations
//!
//! - [`SentinelS3Provider`] - anonymous access to the public Sentinel-2 L1C
//!   tile bucket, with a local band cache
//!
//! ```ignore
//! use sentinel_tms::provider::{ProductProvider, ReqwestClient, SentinelS3Provider};
//!
//! let provider = SentinelS3Provider::new(ReqwestClient::new()?, bands_dir);
//! let date = provider.last_available_date("31TCJ").ok_or("no imagery")?;
//! let bands = provider.find_product_in_zone("31TCJ", date, &BandTriple::default())?;
//! ```

mod http;
mod sentinel;
mod types;

pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use sentinel::{
    SentinelS3Provider, DEFAULT_BAND_EXTENSION, DEFAULT_MAX_LOOKBACK_DAYS, SENTINEL_BASE_URL,
};
pub use types::{BandPaths, ProductProvider, ProviderError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
