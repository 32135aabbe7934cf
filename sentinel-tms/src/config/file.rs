//! Typed view of the INI configuration file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::{config_file_path, default_cache_directory, ConfigError};
use crate::coord::{MAX_ZOOM, MIN_ZOOM};
use crate::imagery::DEFAULT_OUTPUT_SIZE;
use crate::orchestrator::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::pipeline::DEFAULT_EXTRACTION_WORKERS;
use crate::provider::{
    DEFAULT_BAND_EXTENSION, DEFAULT_MAX_LOOKBACK_DAYS, DEFAULT_TIMEOUT_SECS, SENTINEL_BASE_URL,
};
use crate::raster::GEOTIFF_EXTENSIONS;
use crate::zone::DEFAULT_NAME_PROPERTY;

/// Default listen address of the tile server.
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Default zone file name, next to the config file.
pub const DEFAULT_ZONES_FILE: &str = "zones.geojson";

/// Largest zoom level the tile grid math supports.
const MAX_SUPPORTED_ZOOM: u8 = 30;

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

impl CacheSettings {
    /// Directory holding produced tiles.
    pub fn tiles_dir(&self) -> PathBuf {
        self.directory.join("tiles")
    }

    /// Directory holding downloaded band files.
    pub fn bands_dir(&self) -> PathBuf {
        self.directory.join("bands")
    }
}

/// `[zones]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSettings {
    pub file: PathBuf,
    pub name_property: String,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub band_extension: String,
    pub timeout: Duration,
    pub max_lookback_days: u32,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub extraction_workers: usize,
    pub output_size: u32,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// File the settings were read from (or would be read from).
    pub path: PathBuf,
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub zones: ZoneSettings,
    pub provider: ProviderSettings,
    pub pipeline: PipelineSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::defaults_for(config_file_path())
    }
}

impl ConfigFile {
    /// Loads the default config file, or defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads `path`, or defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::defaults_for(path.to_path_buf()));
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(e) => ConfigError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        Self::from_ini(&ini, path)
    }

    /// Parses INI text as if it were read from `path`.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini, path)
    }

    fn defaults_for(path: PathBuf) -> Self {
        let base = base_dir(&path);
        Self {
            server: ServerSettings {
                bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            },
            cache: CacheSettings {
                directory: default_cache_directory(),
            },
            zones: ZoneSettings {
                file: base.join(DEFAULT_ZONES_FILE),
                name_property: DEFAULT_NAME_PROPERTY.to_string(),
            },
            provider: ProviderSettings {
                base_url: SENTINEL_BASE_URL.to_string(),
                band_extension: DEFAULT_BAND_EXTENSION.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                max_lookback_days: DEFAULT_MAX_LOOKBACK_DAYS,
            },
            pipeline: PipelineSettings {
                extraction_workers: DEFAULT_EXTRACTION_WORKERS,
                output_size: DEFAULT_OUTPUT_SIZE,
                poll_interval: DEFAULT_POLL_INTERVAL,
                max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
                min_zoom: MIN_ZOOM,
                max_zoom: MAX_ZOOM,
            },
            path,
        }
    }

    fn from_ini(ini: &Ini, path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::defaults_for(path.to_path_buf());
        let base = base_dir(path);
        let reader = IniReader { ini };

        if let Some(bind) = reader.parse::<SocketAddr>("server", "bind", "expected HOST:PORT")? {
            config.server.bind = bind;
        }

        if let Some(directory) = reader.get("cache", "directory") {
            config.cache.directory = resolve(&base, directory);
        }

        if let Some(file) = reader.get("zones", "file") {
            config.zones.file = resolve(&base, file);
        }
        if let Some(name) = reader.get("zones", "name_property") {
            config.zones.name_property = name.to_string();
        }

        if let Some(url) = reader.get("provider", "base_url") {
            config.provider.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ext) = reader.get("provider", "band_extension") {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            if !GEOTIFF_EXTENSIONS.contains(&ext.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "provider.band_extension".to_string(),
                    value: ext,
                    reason: format!(
                        "bands must be GeoTIFF ({}); jp2 products need a GeoTIFF mirror",
                        GEOTIFF_EXTENSIONS.join(", ")
                    ),
                });
            }
            config.provider.band_extension = ext;
        }
        if let Some(secs) = reader.positive::<u64>("provider", "timeout")? {
            config.provider.timeout = Duration::from_secs(secs);
        }
        let lookback = reader.parse::<u32>("provider", "max_lookback_days", "expected a number of days")?;
        if let Some(days) = lookback {
            config.provider.max_lookback_days = days;
        }

        let pipeline = &mut config.pipeline;
        if let Some(workers) = reader.positive::<usize>("pipeline", "extraction_workers")? {
            pipeline.extraction_workers = workers;
        }
        if let Some(size) = reader.positive::<u32>("pipeline", "output_size")? {
            pipeline.output_size = size;
        }
        if let Some(ms) = reader.positive::<u64>("pipeline", "poll_interval_ms")? {
            pipeline.poll_interval = Duration::from_millis(ms);
        }
        let attempts = reader.parse::<u32>("pipeline", "max_poll_attempts", "expected a number")?;
        if let Some(attempts) = attempts {
            pipeline.max_poll_attempts = attempts;
        }
        if let Some(zoom) = reader.zoom("pipeline", "min_zoom")? {
            pipeline.min_zoom = zoom;
        }
        if let Some(zoom) = reader.zoom("pipeline", "max_zoom")? {
            pipeline.max_zoom = zoom;
        }
        if pipeline.min_zoom > pipeline.max_zoom {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.min_zoom".to_string(),
                value: pipeline.min_zoom.to_string(),
                reason: format!("must not exceed pipeline.max_zoom ({})", pipeline.max_zoom),
            });
        }

        Ok(config)
    }
}

/// Typed accessors over a loaded INI document.
struct IniReader<'a> {
    ini: &'a Ini,
}

impl IniReader<'_> {
    /// Non-empty trimmed value of `section.key`.
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini
            .section(Some(section))
            .and_then(|s| s.get(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(
        &self,
        section: &str,
        key: &str,
        expected: &str,
    ) -> Result<Option<T>, ConfigError> {
        self.get(section, key)
            .map(|value| {
                value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                    key: format!("{}.{}", section, key),
                    value: value.to_string(),
                    reason: expected.to_string(),
                })
            })
            .transpose()
    }

    fn positive<T: FromStr + Default + PartialEq>(
        &self,
        section: &str,
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        let expected = "expected a positive integer";
        match self.parse::<T>(section, key, expected)? {
            Some(value) if value == T::default() => Err(ConfigError::InvalidValue {
                key: format!("{}.{}", section, key),
                value: "0".to_string(),
                reason: expected.to_string(),
            }),
            other => Ok(other),
        }
    }

    fn zoom(&self, section: &str, key: &str) -> Result<Option<u8>, ConfigError> {
        let expected = format!("expected a zoom level in 0..={}", MAX_SUPPORTED_ZOOM);
        match self.parse::<u8>(section, key, &expected)? {
            Some(zoom) if zoom > MAX_SUPPORTED_ZOOM => Err(ConfigError::InvalidValue {
                key: format!("{}.{}", section, key),
                value: zoom.to_string(),
                reason: expected,
            }),
            other => Ok(other),
        }
    }
}

fn base_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
