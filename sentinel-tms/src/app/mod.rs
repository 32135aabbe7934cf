//! Application bootstrap and lifecycle management.
//!
//! [`TileServiceApp`] replaces process-wide singletons with one explicit
//! context built at startup: the zone index, the per-zone date cache and the
//! pipeline are created once and shared with every request through the
//! orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        TileServiceApp                          │
//! │                                                                │
//! │  ZoneIndex ◄─── zones.geojson                                  │
//! │  DateResolver ◄── ProductProvider (SentinelS3Provider)         │
//! │  Pipeline ◄────── ProductProvider + RasterOpener (GeoTIFF)     │
//! │                   (workers start on first submission)          │
//! │  TileOrchestrator ◄── all of the above                         │
//! │                                                                │
//! │  shutdown() ──► CancellationToken ──► pipeline workers         │
//! └───────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::TileServiceApp;
pub use config::AppConfig;
pub use error::AppError;
