//! Configuration file handling.
//!
//! Settings live in an INI file, by default `~/.sentinel-tms/config.ini`.
//! Every key is optional; missing keys and a missing file fall back to the
//! defaults below.
//!
//! ```ini
//! [server]
//! bind = 0.0.0.0:5000
//!
//! [cache]
//! directory = /var/cache/sentinel-tms
//!
//! [zones]
//! file = zones.geojson
//! name_property = Name
//!
//! [provider]
//! base_url = https://sentinel-s2-l1c.s3.amazonaws.com/tiles
//! # GeoTIFF only: the public bucket serves jp2, use a GeoTIFF mirror
//! band_extension = tif
//! timeout = 60
//! max_lookback_days = 60
//!
//! [pipeline]
//! extraction_workers = 5
//! output_size = 512
//! poll_interval_ms = 1000
//! max_poll_attempts = 60
//! min_zoom = 9
//! max_zoom = 14
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

mod file;

pub use file::{
    CacheSettings, ConfigFile, PipelineSettings, ProviderSettings, ServerSettings, ZoneSettings,
};

use std::path::PathBuf;

use thiserror::Error;

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = ".sentinel-tms";

/// Name of the configuration file inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Default configuration directory (`~/.sentinel-tms`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Default configuration file path (`~/.sentinel-tms/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Default cache directory (`<platform cache dir>/sentinel-tms`).
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(config_directory)
        .join("sentinel-tms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".sentinel-tms/config.ini"));
    }

    #[test]
    fn test_default_cache_directory() {
        assert!(default_cache_directory().ends_with("sentinel-tms"));
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            key: "pipeline.output_size".to_string(),
            value: "big".to_string(),
            reason: "expected a positive integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'big' for pipeline.output_size: expected a positive integer"
        );
    }
}
