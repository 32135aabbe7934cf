//! Pipeline telemetry.
//!
//! Lock-free atomic counters recorded by the orchestrator and the pipeline
//! stages, readable at any time as a plain [`TelemetrySnapshot`].
//!
//! # Architecture
//!
//! ```text
//! Orchestrator ─┐
//! Acquisition  ─┼──► PipelineMetrics ──► TelemetrySnapshot ──► logs, CLI, tests
//! Extraction   ─┘    (atomic counters)   (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sentinel_tms::telemetry::PipelineMetrics;
//!
//! let metrics = Arc::new(PipelineMetrics::new());
//! metrics.job_submitted();
//! metrics.tile_written();
//!
//! let snapshot = metrics.snapshot();
//! println!("tiles written: {}", snapshot.tiles_written);
//! ```

mod metrics;
mod snapshot;

pub use metrics::PipelineMetrics;
pub use snapshot::TelemetrySnapshot;
