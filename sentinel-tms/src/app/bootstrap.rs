//! Application bootstrap implementation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::date::DateResolver;
use crate::orchestrator::TileOrchestrator;
use crate::pipeline::Pipeline;
use crate::provider::{ProductProvider, ReqwestClient, SentinelS3Provider};
use crate::raster::{GeoTiffOpener, RasterOpener};
use crate::telemetry::{PipelineMetrics, TelemetrySnapshot};
use crate::zone::{load_zones_geojson, ZoneIndex};

/// Process-scoped tile service.
///
/// Owns the zone index, the date cache, the pipeline and the orchestrator.
/// Build it once at startup and share it with request handlers.
///
/// # Example
///
/// ```ignore
/// use sentinel_tms::app::{AppConfig, TileServiceApp};
///
/// let app = TileServiceApp::start(config)?;
/// let path = runtime.block_on(app.orchestrator().generate_tile(x, y, z, &options))?;
///
/// app.shutdown();
/// ```
pub struct TileServiceApp {
    config: AppConfig,
    zones: Arc<ZoneIndex>,
    pipeline: Arc<Pipeline>,
    orchestrator: Arc<TileOrchestrator>,
    metrics: Arc<PipelineMetrics>,
    shutdown: CancellationToken,
}

impl TileServiceApp {
    /// Starts the service with the object-store provider and GeoTIFF bands.
    ///
    /// Blocking: creates the cache directories, reads the zone file and
    /// builds the HTTP client. Call it outside the async runtime.
    pub fn start(config: AppConfig) -> Result<Self, AppError> {
        info!(
            cache_dir = %config.cache_dir.display(),
            zones_file = %config.zones_file.display(),
            "Starting tile service"
        );

        let bands_dir = config.bands_dir();
        create_dir(config.tiles_dir())?;
        create_dir(&bands_dir)?;

        let zones = load_zones_geojson(&config.zones_file, &config.zone_name_property)?;

        let client = ReqwestClient::with_timeout(config.provider.timeout.as_secs())
            .map_err(AppError::HttpClient)?;
        let provider = SentinelS3Provider::new(client, bands_dir)
            .with_base_url(config.provider.base_url.clone())
            .with_band_extension(config.provider.band_extension.clone())
            .with_max_lookback_days(config.provider.max_lookback_days);

        Self::assemble(
            config,
            ZoneIndex::new(zones),
            Arc::new(provider),
            Arc::new(GeoTiffOpener),
        )
    }

    /// Wires the service around the given zones, provider and raster backend.
    pub fn assemble(
        config: AppConfig,
        zones: ZoneIndex,
        provider: Arc<dyn ProductProvider>,
        opener: Arc<dyn RasterOpener>,
    ) -> Result<Self, AppError> {
        if zones.is_empty() {
            return Err(AppError::Config("no zones loaded".to_string()));
        }
        create_dir(config.tiles_dir())?;

        let shutdown = CancellationToken::new();
        let metrics = Arc::new(PipelineMetrics::new());
        let zones = Arc::new(zones);
        let dates = Arc::new(DateResolver::new(Arc::clone(&provider)));

        let pipeline = Arc::new(Pipeline::new(
            config.pipeline.clone(),
            provider,
            opener,
            Arc::clone(&metrics),
            shutdown.child_token(),
        ));

        let orchestrator = Arc::new(TileOrchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&zones),
            dates,
            Arc::clone(&pipeline),
            Arc::clone(&metrics),
        ));

        info!(
            zones = zones.len(),
            extraction_workers = config.pipeline.extraction_workers,
            tiles_dir = %config.tiles_dir().display(),
            "Tile service ready"
        );

        Ok(Self {
            config,
            zones,
            pipeline,
            orchestrator,
            metrics,
            shutdown,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<TileOrchestrator> {
        &self.orchestrator
    }

    pub fn zones(&self) -> &ZoneIndex {
        &self.zones
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }

    /// Stops the pipeline workers. Queued Jobs are discarded.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        info!(telemetry = %self.metrics.snapshot(), "Shutting down tile service");
        self.shutdown.cancel();
    }
}

fn create_dir(path: &Path) -> Result<(), AppError> {
    fs::create_dir_all(path).map_err(|source| AppError::CacheDirectory {
        path: path.to_path_buf(),
        source,
    })
}
