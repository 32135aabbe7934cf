//! Sentinel TMS - on-demand map tiles from Sentinel-2 imagery
//!
//! This library computes TMS tiles from Sentinel-2 band rasters when they are
//! first requested and memoizes them on disk. A request resolves the imagery
//! zone and latest product date for the tile, then either returns the cached
//! PNG or hands a Job to a two-stage pipeline (band acquisition, then
//! extraction) and waits a bounded time for the tile to appear.
//!
//! # Modules
//!
//! - [`coord`] - tile to WGS84 bounds, WGS84 to raster pixel
//! - [`zone`] - point to imagery zone lookup
//! - [`date`] - per-zone latest product date cache
//! - [`provider`] - product acquisition (public Sentinel-2 object store)
//! - [`raster`] - band rasters, geotransforms and CRS transforms
//! - [`tile`] - request options, cache key and error taxonomy
//! - [`imagery`] - normalize, de-skew, crop and encode tiles
//! - [`pipeline`] - acquisition and extraction workers
//! - [`orchestrator`] - `generate_tile`, the request entry point
//! - [`telemetry`] - pipeline counters
//! - [`config`] - INI configuration file
//! - [`app`] - process-scoped service context

pub mod app;
pub mod config;
pub mod coord;
pub mod date;
pub mod imagery;
pub mod orchestrator;
pub mod pipeline;
pub mod provider;
pub mod raster;
pub mod telemetry;
pub mod tile;
pub mod zone;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
