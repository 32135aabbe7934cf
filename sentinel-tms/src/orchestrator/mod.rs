//! Tile request orchestration.
//!
//! [`TileOrchestrator::generate_tile`] is the single entry point of the
//! library for the dispatch layer. It validates a request, resolves its zone
//! and date, answers from the tile cache when it can and otherwise hands a
//! Job to the pipeline and waits a bounded time for the tile to appear.
//!
//! # Request flow
//!
//! ```text
//! (x, y, z, options)
//!     │
//!     ├─ zoom outside range ─────────────────────────► InvalidRequest
//!     ▼
//! bbox ─► zone at both corners ─ missing / differ ───► ZoneNotFound / MultiZoneTile
//!     │
//!     ├─ zone option differs ────────────────────────► ZoneMismatch
//!     ▼
//! date (option or DateResolver) ─ none ──────────────► NoDateFound
//!     │
//!     ▼
//! cache key ─► file exists ──────────────────────────► Ok(path)
//!     │
//!     ▼
//! submit Job ─► poll file ─ appears ─────────────────► Ok(path)
//!                   └────── time out ────────────────► NotYetReady
//! ```
//!
//! A timed-out request does not cancel its Job; retrying the same request
//! later hits the cache once the Job is done.

mod config;

pub use config::{OrchestratorConfig, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::coord::{bbox_from_tile, GeoBounds, LonLat, TileCoord};
use crate::date::DateResolver;
use crate::pipeline::{Job, Pipeline, Submission};
use crate::telemetry::PipelineMetrics;
use crate::tile::{tile_file_name, TileError, TileOptions};
use crate::zone::ZoneIndex;

/// Validates tile requests and drives them through cache and pipeline.
pub struct TileOrchestrator {
    config: OrchestratorConfig,
    zones: Arc<ZoneIndex>,
    dates: Arc<DateResolver>,
    pipeline: Arc<Pipeline>,
    metrics: Arc<PipelineMetrics>,
}

impl TileOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        zones: Arc<ZoneIndex>,
        dates: Arc<DateResolver>,
        pipeline: Arc<Pipeline>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            config,
            zones,
            dates,
            pipeline,
            metrics,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Produces the tile `(x, y, z)` and returns the path of its PNG.
    ///
    /// Waits at most [`OrchestratorConfig::max_wait`] for a tile that is not
    /// cached yet.
    #[instrument(skip(self, options), fields(bands = %options.bands))]
    pub async fn generate_tile(
        &self,
        x: u32,
        y: u32,
        z: u32,
        options: &TileOptions,
    ) -> Result<PathBuf, TileError> {
        let tile = self.validate(x, y, z)?;
        let bounds = bbox_from_tile(tile.x, tile.y, tile.zoom);

        let zone = self.resolve_zone(&bounds)?;
        if let Some(requested) = &options.zone {
            if *requested != zone {
                return Err(TileError::ZoneMismatch {
                    requested: requested.clone(),
                    resolved: zone,
                });
            }
        }

        let date = match options.date {
            Some(date) => date,
            None => self.resolve_date(&zone).await?,
        };

        let output = self.config.tiles_dir.join(tile_file_name(
            &zone,
            date,
            tile,
            &options.bands,
            &options.clips,
        ));

        if file_exists(&output).await {
            debug!(path = %output.display(), "Tile cache hit");
            self.metrics.cache_hit();
            return Ok(output);
        }

        let job = Job {
            zone,
            date,
            bounds,
            output: output.clone(),
            bands: options.bands,
            clips: options.clips,
            band_paths: None,
        };
        match self.pipeline.submit(job) {
            Ok(Submission::Queued) => {}
            Ok(Submission::Coalesced) => {
                debug!(path = %output.display(), "Waiting on in-flight job");
            }
            Err(job) => {
                warn!(job = %job, "Pipeline is shut down");
                return Err(TileError::Internal("tile pipeline is shut down".to_string()));
            }
        }

        self.wait_for(output).await
    }

    fn validate(&self, x: u32, y: u32, z: u32) -> Result<TileCoord, TileError> {
        let zoom = u8::try_from(z)
            .ok()
            .filter(|zoom| (self.config.min_zoom..=self.config.max_zoom).contains(zoom))
            .ok_or_else(|| {
                TileError::InvalidRequest(format!(
                    "zoom {} outside [{}, {}]",
                    z, self.config.min_zoom, self.config.max_zoom
                ))
            })?;

        let tiles_per_axis = 1u64 << zoom;
        if u64::from(x) >= tiles_per_axis || u64::from(y) >= tiles_per_axis {
            return Err(TileError::InvalidRequest(format!(
                "tile ({}, {}) outside zoom {} grid",
                x, y, zoom
            )));
        }

        Ok(TileCoord::new(x, y, zoom))
    }

    /// Zone holding both bbox corners.
    fn resolve_zone(&self, bounds: &GeoBounds) -> Result<String, TileError> {
        let first = self.zone_at(bounds.min)?;
        let second = self.zone_at(bounds.max)?;
        if first != second {
            return Err(TileError::MultiZoneTile {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
        Ok(first.to_string())
    }

    fn zone_at(&self, point: LonLat) -> Result<&str, TileError> {
        self.zones
            .find_zone(point.lon, point.lat)
            .map(|zone| zone.name())
            .ok_or(TileError::ZoneNotFound {
                lon: point.lon,
                lat: point.lat,
            })
    }

    async fn resolve_date(&self, zone: &str) -> Result<NaiveDate, TileError> {
        let dates = Arc::clone(&self.dates);
        let zone = zone.to_string();
        tokio::task::spawn_blocking(move || dates.resolve(&zone))
            .await
            .map_err(|e| TileError::Internal(format!("date resolution failed: {}", e)))?
    }

    async fn wait_for(&self, output: PathBuf) -> Result<PathBuf, TileError> {
        for _ in 0..self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval).await;
            if file_exists(&output).await {
                info!(path = %output.display(), "Tile ready");
                return Ok(output);
            }
        }

        debug!(path = %output.display(), "Tile not ready before timeout");
        self.metrics.request_timed_out();
        Err(TileError::NotYetReady(output))
    }
}

async fn file_exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;
    use crate::provider::{BandPaths, ProductProvider, ProviderError};
    use crate::raster::mock::MockOpener;
    use crate::tile::{BandTriple, ErrorClass};
    use crate::zone::Zone;
    use geo::{polygon, MultiPolygon};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Serves the mock bands `b02`, `b03`, `b04` or fails every acquisition.
    struct TestProvider {
        latest: Option<NaiveDate>,
        available: bool,
        acquisitions: AtomicUsize,
    }

    impl ProductProvider for TestProvider {
        fn last_available_date(&self, _zone: &str) -> Option<NaiveDate> {
            self.latest
        }

        fn find_product_in_zone(
            &self,
            zone: &str,
            date: NaiveDate,
            bands: &BandTriple,
        ) -> Result<BandPaths, ProviderError> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return Err(ProviderError::HttpError(format!("no product {} {}", zone, date)));
            }
            Ok(bands
                .iter()
                .map(|band| (band, PathBuf::from(format!("b{:02}", band))))
                .collect())
        }
    }

    fn provider(available: bool) -> Arc<TestProvider> {
        Arc::new(TestProvider {
            latest: NaiveDate::from_ymd_opt(2024, 6, 1),
            available,
            acquisitions: AtomicUsize::new(0),
        })
    }

    fn zone(name: &str, lon: (f64, f64), lat: (f64, f64)) -> Zone {
        let poly = polygon![
            (x: lon.0, y: lat.0),
            (x: lon.1, y: lat.0),
            (x: lon.1, y: lat.1),
            (x: lon.0, y: lat.1),
            (x: lon.0, y: lat.0),
        ];
        Zone::new(name, MultiPolygon::new(vec![poly])).unwrap()
    }

    /// 31TCJ over the mock rasters, 31THR east of it, and a split pair further east.
    fn zones() -> Arc<ZoneIndex> {
        Arc::new(ZoneIndex::new(vec![
            zone("31TCJ", (0.0, 1.0), (43.0, 44.0)),
            zone("31THR", (1.0, 1.6), (43.0, 44.0)),
            zone("WEST", (1.6, 1.72), (43.0, 44.0)),
            zone("EAST", (1.72, 2.5), (43.0, 44.0)),
        ]))
    }

    struct Fixture {
        orchestrator: TileOrchestrator,
        metrics: Arc<PipelineMetrics>,
        pipeline: Arc<Pipeline>,
        _dir: tempfile::TempDir,
    }

    fn fixture(provider: Arc<TestProvider>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let metrics = Arc::new(PipelineMetrics::new());
        let opener = MockOpener::new()
            .with_band("b02", 0.0)
            .with_band("b03", 1250.0)
            .with_band("b04", 2500.0);
        let pipeline = Arc::new(Pipeline::new(
            PipelineConfig::default().with_output_size(32),
            provider.clone(),
            Arc::new(opener),
            Arc::clone(&metrics),
            CancellationToken::new(),
        ));
        let config = OrchestratorConfig::new(dir.path().join("tiles"))
            .with_poll_interval(Duration::from_millis(20))
            .with_max_poll_attempts(100);
        let orchestrator = TileOrchestrator::new(
            config,
            zones(),
            Arc::new(DateResolver::new(provider)),
            Arc::clone(&pipeline),
            Arc::clone(&metrics),
        );
        Fixture {
            orchestrator,
            metrics,
            pipeline,
            _dir: dir,
        }
    }

    // z=14 tile spanning lon 0.483..0.505, lat ~43.6
    const IN_31TCJ: (u32, u32, u32) = (8214, 5981, 14);
    // z=14 tile spanning lon 1.450..1.472
    const IN_31THR: (u32, u32, u32) = (8258, 5981, 14);
    // z=14 tile spanning lon 1.714..1.736
    const ACROSS_WEST_EAST: (u32, u32, u32) = (8270, 5981, 14);

    #[tokio::test]
    async fn test_zoom_out_of_range_is_rejected_without_jobs() {
        let f = fixture(provider(true));

        for z in [8, 15, 300] {
            let result = f.orchestrator.generate_tile(0, 0, z, &TileOptions::default()).await;
            assert!(matches!(result, Err(TileError::InvalidRequest(_))), "zoom {}", z);
        }
        assert_eq!(f.metrics.snapshot().jobs_submitted, 0);
        assert!(!f.pipeline.is_started());
    }

    #[tokio::test]
    async fn test_index_outside_grid_is_rejected() {
        let f = fixture(provider(true));
        let result = f
            .orchestrator
            .generate_tile(512, 0, 9, &TileOptions::default())
            .await;
        assert!(matches!(result, Err(TileError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_zone_not_found() {
        let f = fixture(provider(true));
        let result = f.orchestrator.generate_tile(0, 0, 9, &TileOptions::default()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, TileError::ZoneNotFound { .. }));
        assert_eq!(err.class(), ErrorClass::DataCannotBeComputed);
    }

    #[tokio::test]
    async fn test_tile_across_zones() {
        let f = fixture(provider(true));
        let (x, y, z) = ACROSS_WEST_EAST;
        let result = f.orchestrator.generate_tile(x, y, z, &TileOptions::default()).await;
        assert_eq!(
            result,
            Err(TileError::MultiZoneTile {
                first: "WEST".to_string(),
                second: "EAST".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_zone_option_must_match() {
        let f = fixture(provider(true));
        let (x, y, z) = IN_31THR;
        let options = TileOptions::default().with_zone("31TCJ");

        let result = f.orchestrator.generate_tile(x, y, z, &options).await;
        assert_eq!(
            result,
            Err(TileError::ZoneMismatch {
                requested: "31TCJ".to_string(),
                resolved: "31THR".to_string(),
            })
        );
        assert_eq!(f.metrics.snapshot().jobs_submitted, 0);
    }

    #[tokio::test]
    async fn test_no_date_found() {
        let provider = Arc::new(TestProvider {
            latest: None,
            available: true,
            acquisitions: AtomicUsize::new(0),
        });
        let f = fixture(provider);
        let (x, y, z) = IN_31TCJ;

        let result = f.orchestrator.generate_tile(x, y, z, &TileOptions::default()).await;
        assert_eq!(result, Err(TileError::NoDateFound("31TCJ".to_string())));
    }

    #[tokio::test]
    async fn test_tile_is_produced_then_cached() {
        let f = fixture(provider(true));
        let (x, y, z) = IN_31TCJ;
        let options = TileOptions::default();

        let path = f.orchestrator.generate_tile(x, y, z, &options).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "31TCJ_20240601_8214_5981_14_2_3_4_0_2500_0_2500_0_2500.png"
        );
        let tile = image::open(&path).unwrap().to_rgb8();
        assert_eq!(tile.dimensions(), (32, 32));

        let again = f.orchestrator.generate_tile(x, y, z, &options).await.unwrap();
        assert_eq!(again, path);

        let snapshot = f.metrics.snapshot();
        assert_eq!(snapshot.jobs_submitted, 1);
        assert_eq!(snapshot.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_served_without_pipeline() {
        let f = fixture(provider(true));
        let (x, y, z) = IN_31TCJ;
        let date = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        let options = TileOptions::default().with_date(date);

        let expected = f.orchestrator.config().tiles_dir().join(tile_file_name(
            "31TCJ",
            date,
            TileCoord::new(x, y, z as u8),
            &options.bands,
            &options.clips,
        ));
        std::fs::create_dir_all(expected.parent().unwrap()).unwrap();
        std::fs::write(&expected, b"png").unwrap();

        let path = f.orchestrator.generate_tile(x, y, z, &options).await.unwrap();
        assert_eq!(path, expected);
        assert_eq!(f.metrics.snapshot().jobs_submitted, 0);
        assert!(!f.pipeline.is_started());
    }

    #[tokio::test]
    async fn test_failed_production_times_out_as_not_yet_ready() {
        let provider = provider(false);
        let f = fixture(provider.clone());
        let (x, y, z) = IN_31TCJ;

        let result = f.orchestrator.generate_tile(x, y, z, &TileOptions::default()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, TileError::NotYetReady(_)));
        assert!(err.is_retryable());

        let snapshot = f.metrics.snapshot();
        assert_eq!(snapshot.acquisitions_failed, 1);
        assert_eq!(snapshot.requests_timed_out, 1);
        assert_eq!(provider.acquisitions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shut_down_pipeline_is_internal_error() {
        let f = fixture(provider(true));
        let (x, y, z) = IN_31TCJ;
        f.pipeline.shutdown();

        let started = std::time::Instant::now();
        for _ in 0..2 {
            let result = f.orchestrator.generate_tile(x, y, z, &TileOptions::default()).await;
            assert!(matches!(result, Err(TileError::Internal(_))));
        }
        assert!(started.elapsed() < f.orchestrator.config().max_wait());
        assert_eq!(f.metrics.snapshot().jobs_submitted, 0);
        assert_eq!(f.metrics.snapshot().jobs_coalesced, 0);
    }
}
