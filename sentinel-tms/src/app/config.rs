//! Application configuration for TileServiceApp.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{ConfigFile, ProviderSettings};
use crate::orchestrator::OrchestratorConfig;
use crate::pipeline::PipelineConfig;
use crate::provider::{
    DEFAULT_BAND_EXTENSION, DEFAULT_MAX_LOOKBACK_DAYS, DEFAULT_TIMEOUT_SECS, SENTINEL_BASE_URL,
};
use crate::zone::DEFAULT_NAME_PROPERTY;

/// Everything needed to assemble a [`super::TileServiceApp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the on-disk cache; tiles and bands live below it.
    pub cache_dir: PathBuf,

    /// GeoJSON file with the zone polygons.
    pub zones_file: PathBuf,

    /// Feature property holding the zone name.
    pub zone_name_property: String,

    pub provider: ProviderSettings,

    pub pipeline: PipelineConfig,

    pub orchestrator: OrchestratorConfig,
}

impl AppConfig {
    /// Creates a config with default provider and pipeline settings.
    pub fn new(cache_dir: impl Into<PathBuf>, zones_file: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        Self {
            orchestrator: OrchestratorConfig::new(cache_dir.join("tiles")),
            zones_file: zones_file.into(),
            zone_name_property: DEFAULT_NAME_PROPERTY.to_string(),
            provider: ProviderSettings {
                base_url: SENTINEL_BASE_URL.to_string(),
                band_extension: DEFAULT_BAND_EXTENSION.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                max_lookback_days: DEFAULT_MAX_LOOKBACK_DAYS,
            },
            pipeline: PipelineConfig::default(),
            cache_dir,
        }
    }

    /// Translates a loaded configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let settings = &config.pipeline;
        Self {
            cache_dir: config.cache.directory.clone(),
            zones_file: config.zones.file.clone(),
            zone_name_property: config.zones.name_property.clone(),
            provider: config.provider.clone(),
            pipeline: PipelineConfig::default()
                .with_extraction_workers(settings.extraction_workers)
                .with_output_size(settings.output_size),
            orchestrator: OrchestratorConfig::new(config.cache.tiles_dir())
                .with_zoom_range(settings.min_zoom, settings.max_zoom)
                .with_poll_interval(settings.poll_interval)
                .with_max_poll_attempts(settings.max_poll_attempts),
        }
    }

    pub fn tiles_dir(&self) -> &Path {
        self.orchestrator.tiles_dir()
    }

    pub fn bands_dir(&self) -> PathBuf {
        self.cache_dir.join("bands")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_cache_layout() {
        let config = AppConfig::new("/cache", "/data/zones.geojson");
        assert_eq!(config.tiles_dir(), Path::new("/cache/tiles"));
        assert_eq!(config.bands_dir(), PathBuf::from("/cache/bands"));
        assert_eq!(config.zone_name_property, "Name");
        assert_eq!(config.pipeline.extraction_workers, 5);
    }

    #[test]
    fn test_from_config_file() {
        let file = ConfigFile::parse(
            "[cache]\ndirectory = /srv/tms\n[pipeline]\nextraction_workers = 3\n\
             output_size = 256\nmax_poll_attempts = 10\nmin_zoom = 10\n",
            Path::new("/etc/tms/config.ini"),
        )
        .unwrap();

        let config = AppConfig::from_config_file(&file);
        assert_eq!(config.tiles_dir(), Path::new("/srv/tms/tiles"));
        assert_eq!(config.zones_file, PathBuf::from("/etc/tms/zones.geojson"));
        assert_eq!(config.pipeline.extraction_workers, 3);
        assert_eq!(config.pipeline.output_size, 256);
        assert_eq!(config.orchestrator.max_poll_attempts, 10);
        assert_eq!(config.orchestrator.min_zoom, 10);
    }
}
