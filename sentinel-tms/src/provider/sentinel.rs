//! Sentinel-2 L1C products from the public object-store tile bucket.
//!
//! # URL Pattern
//!
//! `{base}/{utm}/{latitude_band}/{square}/{year}/{month}/{day}/0/{file}`
//!
//! - `utm` - UTM zone number without leading zero (`31`, `1`)
//! - `latitude_band` - MGRS latitude band letter (`T`)
//! - `square` - 100 km grid square (`CJ`)
//! - month and day are not zero padded
//!
//! Product availability is probed with a HEAD request on `preview.jpg`; band
//! files are `B{NN}.{ext}`. Downloaded bands are cached in a local directory
//! and reused by later requests for the same product.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, Local, NaiveDate};
use tracing::{debug, info, warn};

use super::{BandPaths, HttpClient, ProductProvider, ProviderError};
use crate::tile::BandTriple;

/// Base URL for the Sentinel-2 L1C tile bucket.
pub const SENTINEL_BASE_URL: &str = "https://sentinel-s2-l1c.s3.amazonaws.com/tiles";

/// Default number of days searched backward for an available product.
pub const DEFAULT_MAX_LOOKBACK_DAYS: u32 = 60;

/// Default band file extension.
///
/// The public L1C bucket stores bands as JPEG 2000 (`jp2`), which the GeoTIFF
/// backend cannot decode. Point `base_url` at a GeoTIFF mirror of the bucket
/// layout.
pub const DEFAULT_BAND_EXTENSION: &str = "tif";

/// Sentinel-2 product provider over anonymous HTTP access.
///
/// # Example
///
/// ```ignore
/// use sentinel_tms::provider::{ReqwestClient, SentinelS3Provider};
///
/// let client = ReqwestClient::new()?;
/// let provider = SentinelS3Provider::new(client, "/var/cache/sentinel-tms/bands")
///     .with_max_lookback_days(30);
/// let date = provider.last_available_date("31TCJ");
/// ```
pub struct SentinelS3Provider<C: HttpClient> {
    http_client: C,
    base_url: String,
    bands_dir: PathBuf,
    band_extension: String,
    max_lookback_days: u32,
}

impl<C: HttpClient> SentinelS3Provider<C> {
    pub fn new(http_client: C, bands_dir: impl Into<PathBuf>) -> Self {
        Self {
            http_client,
            base_url: SENTINEL_BASE_URL.to_string(),
            bands_dir: bands_dir.into(),
            band_extension: DEFAULT_BAND_EXTENSION.to_string(),
            max_lookback_days: DEFAULT_MAX_LOOKBACK_DAYS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_band_extension(mut self, extension: impl Into<String>) -> Self {
        self.band_extension = extension.into();
        self
    }

    pub fn with_max_lookback_days(mut self, days: u32) -> Self {
        self.max_lookback_days = days;
        self
    }

    pub fn bands_dir(&self) -> &Path {
        &self.bands_dir
    }

    /// Object-store prefix of a zone.
    ///
    /// Zone names are `{utm}{latitude_band}{square}`, e.g. `31TCJ`; names
    /// shorter than five characters are rejected.
    pub fn zone_url(&self, zone: &str) -> Result<String, ProviderError> {
        if zone.len() < 5 || !zone.is_ascii() {
            return Err(ProviderError::InvalidZone(zone.to_string()));
        }

        let utm = &zone[..2];
        let utm = utm.strip_prefix('0').unwrap_or(utm);
        let latitude_band = &zone[2..3];
        let square = &zone[zone.len() - 2..];

        Ok(format!(
            "{}/{}/{}/{}",
            self.base_url, utm, latitude_band, square
        ))
    }

    fn product_url(&self, zone: &str, date: NaiveDate) -> Result<String, ProviderError> {
        Ok(format!(
            "{}/{}/{}/{}/0",
            self.zone_url(zone)?,
            date.year(),
            date.month(),
            date.day()
        ))
    }

    /// Whether a product exists for `zone` on `date`.
    pub fn product_exists(&self, zone: &str, date: NaiveDate) -> Result<bool, ProviderError> {
        let url = format!("{}/preview.jpg", self.product_url(zone, date)?);
        debug!(url = %url, "Probing product");
        self.http_client.exists(&url)
    }

    /// Walks backward from `start` one day at a time until a product exists,
    /// giving up after `max_lookback_days` days or on the first transport error.
    pub fn last_available_date_from(&self, zone: &str, start: NaiveDate) -> Option<NaiveDate> {
        for offset in 0..=i64::from(self.max_lookback_days) {
            let date = start - Duration::days(offset);
            match self.product_exists(zone, date) {
                Ok(true) => {
                    info!(zone, date = %date, "Found latest product");
                    return Some(date);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(zone, date = %date, error = %e, "Product probe failed");
                    return None;
                }
            }
        }

        warn!(
            zone,
            days = self.max_lookback_days,
            "No product found within lookback window"
        );
        None
    }

    /// Local cache path of one band file.
    pub fn band_file_path(&self, zone: &str, date: NaiveDate, band: u8) -> PathBuf {
        self.bands_dir.join(format!(
            "{}_{}_{}_{}_B{:02}.{}",
            zone,
            date.year(),
            date.month(),
            date.day(),
            band,
            self.band_extension
        ))
    }

    fn fetch_band(&self, zone: &str, date: NaiveDate, band: u8) -> Result<PathBuf, ProviderError> {
        let path = self.band_file_path(zone, date, band);
        if path.is_file() {
            debug!(path = %path.display(), "Band found in cache");
            return Ok(path);
        }

        let url = format!(
            "{}/B{:02}.{}",
            self.product_url(zone, date)?,
            band,
            self.band_extension
        );
        info!(zone, band, url = %url, "Downloading band");
        let bytes = self.http_client.get(&url)?;

        write_atomic(&self.bands_dir, &path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Band stored");
        Ok(path)
    }
}

impl<C: HttpClient> ProductProvider for SentinelS3Provider<C> {
    fn last_available_date(&self, zone: &str) -> Option<NaiveDate> {
        self.last_available_date_from(zone, Local::now().date_naive())
    }

    fn find_product_in_zone(
        &self,
        zone: &str,
        date: NaiveDate,
        bands: &BandTriple,
    ) -> Result<BandPaths, ProviderError> {
        let mut paths = BandPaths::with_capacity(3);
        for band in bands.iter() {
            if paths.contains_key(&band) {
                continue;
            }
            paths.insert(band, self.fetch_band(zone, date, band)?);
        }
        Ok(paths)
    }
}

/// Writes `bytes` to `path` through a temp file in `dir` and a rename, so
/// readers never observe a partial file.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ProviderError> {
    let io_error = |e: std::io::Error| ProviderError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    fs::create_dir_all(dir).map_err(io_error)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.write_all(bytes).map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
