//! Two-stage tile production pipeline.
//!
//! Jobs flow through unbounded FIFO queues between a single acquisition
//! worker (I/O bound) and a fixed pool of extraction workers (CPU bound):
//!
//! # Architecture
//!
//! ```text
//!                ┌──────────────────┐          ┌────────────────────┐
//!  submit(Job) ─►│ AcquisitionStage │─ Job ───►│ ExtractionStage ×N │─► tile PNG
//!                │   (1 worker)     │ + bands  │   (shared queue)   │
//!                └────────┬─────────┘          └─────────┬──────────┘
//!                         │ failure                      │ failure
//!                         ▼                              ▼
//!                    warn! + drop                   error! + drop
//! ```
//!
//! Every Job is owned by exactly one stage at a time; it moves through the
//! queues by value. A failing Job is logged and dropped and the worker moves
//! on to the next one. Callers never learn about failures directly: they see
//! the tile file appear or their wait time out.
//!
//! Workers start on the first [`Pipeline::submit`] and run until the
//! pipeline's cancellation token fires.
//!
//! # In-flight coalescing
//!
//! The output path of every queued Job is tracked until the Job finishes.
//! Submitting a Job whose output is already in flight does not enqueue a
//! duplicate. The entry is cleared on success and on failure, so a later
//! request can retry a failed tile.

mod acquisition;
mod extraction;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use dashmap::DashSet;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::GeoBounds;
use crate::imagery::{ImageryError, TileExtractor, DEFAULT_OUTPUT_SIZE};
use crate::provider::{BandPaths, ProductProvider, ProviderError};
use crate::raster::RasterOpener;
use crate::telemetry::PipelineMetrics;
use crate::tile::{BandTriple, ClipRange};

/// Default number of extraction workers.
pub const DEFAULT_EXTRACTION_WORKERS: usize = 5;

// =============================================================================
// Job
// =============================================================================

/// One unit of tile production.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub zone: String,
    pub date: NaiveDate,
    pub bounds: GeoBounds,
    /// Final tile path; doubles as the Job's identity.
    pub output: PathBuf,
    pub bands: BandTriple,
    pub clips: [ClipRange; 3],
    /// Local band files, filled in by the acquisition stage.
    pub band_paths: Option<BandPaths>,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} bands {} -> {}",
            self.zone,
            self.date.format("%Y%m%d"),
            self.bands,
            self.output.display()
        )
    }
}

/// Why a Job was dropped by a stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("product acquisition failed: {0}")]
    Acquisition(#[from] ProviderError),

    #[error("band B{0:02} was not acquired")]
    BandNotAcquired(u8),

    #[error("tile extraction failed: {0}")]
    Extraction(#[from] ImageryError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Pipeline tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Size of the extraction worker pool.
    pub extraction_workers: usize,
    /// Edge length of written tiles in pixels.
    pub output_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_workers: DEFAULT_EXTRACTION_WORKERS,
            output_size: DEFAULT_OUTPUT_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn with_extraction_workers(mut self, workers: usize) -> Self {
        self.extraction_workers = workers;
        self
    }

    pub fn with_output_size(mut self, size: u32) -> Self {
        self.output_size = size;
        self
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Result of [`Pipeline::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The Job was enqueued for acquisition.
    Queued,
    /// A Job for the same output is already in flight; nothing was enqueued.
    Coalesced,
}

/// State shared by all workers.
pub(crate) struct StageContext {
    pub provider: Arc<dyn ProductProvider>,
    pub extractor: Arc<TileExtractor>,
    pub metrics: Arc<PipelineMetrics>,
    pub in_flight: Arc<DashSet<PathBuf>>,
}

impl StageContext {
    /// Marks the Job writing `output` as finished.
    pub fn release(&self, output: &Path) {
        self.in_flight.remove(output);
    }

    /// Closes `queue` and releases every Job still waiting in it.
    pub fn discard(&self, queue: &mut mpsc::UnboundedReceiver<Job>) -> usize {
        queue.close();
        let mut discarded = 0;
        while let Ok(job) = queue.try_recv() {
            self.release(&job.output);
            discarded += 1;
        }
        discarded
    }
}

/// Handle to the tile production pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    context: Arc<StageContext>,
    shutdown: CancellationToken,
    sender: OnceLock<mpsc::UnboundedSender<Job>>,
}

impl Pipeline {
    /// Creates a pipeline. No worker runs until the first submission.
    pub fn new(
        config: PipelineConfig,
        provider: Arc<dyn ProductProvider>,
        opener: Arc<dyn RasterOpener>,
        metrics: Arc<PipelineMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        let extractor = Arc::new(TileExtractor::new(opener, config.output_size));
        Self {
            config,
            context: Arc::new(StageContext {
                provider,
                extractor,
                metrics,
                in_flight: Arc::new(DashSet::new()),
            }),
            shutdown,
            sender: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether the workers have been started.
    pub fn is_started(&self) -> bool {
        self.sender.get().is_some()
    }

    /// Whether a Job writing `output` is queued or running.
    pub fn is_in_flight(&self, output: &Path) -> bool {
        self.context.in_flight.contains(output)
    }

    /// Number of Jobs queued or running.
    pub fn in_flight_count(&self) -> usize {
        self.context.in_flight.len()
    }

    /// Enqueues `job` unless a Job for the same output is already in flight.
    /// Hands the Job back once the pipeline is shut down.
    ///
    /// Starts the workers on first use, so it must be called from within a
    /// Tokio runtime.
    pub fn submit(&self, job: Job) -> Result<Submission, Job> {
        if self.shutdown.is_cancelled() {
            return Err(job);
        }

        if !self.context.in_flight.insert(job.output.clone()) {
            debug!(output = %job.output.display(), "Job already in flight");
            self.context.metrics.job_coalesced();
            return Ok(Submission::Coalesced);
        }

        info!(job = %job, "Job enqueued");
        let output = job.output.clone();
        match self.sender().send(job) {
            Ok(()) => {
                self.context.metrics.job_submitted();
                Ok(Submission::Queued)
            }
            Err(mpsc::error::SendError(job)) => {
                self.context.release(&output);
                Err(job)
            }
        }
    }

    /// Stops all workers. Queued Jobs are discarded and no longer count as
    /// in flight.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn sender(&self) -> &mpsc::UnboundedSender<Job> {
        self.sender.get_or_init(|| self.start_workers())
    }

    fn start_workers(&self) -> mpsc::UnboundedSender<Job> {
        let (acquisition_tx, acquisition_rx) = mpsc::unbounded_channel();
        let (extraction_tx, extraction_rx) = mpsc::unbounded_channel();

        tokio::spawn(acquisition::run(
            acquisition_rx,
            extraction_tx,
            Arc::clone(&self.context),
            self.shutdown.clone(),
        ));

        let workers = self.config.extraction_workers.max(1);
        let extraction_rx = Arc::new(Mutex::new(extraction_rx));
        for worker in 0..workers {
            tokio::spawn(extraction::run(
                worker,
                Arc::clone(&extraction_rx),
                Arc::clone(&self.context),
                self.shutdown.clone(),
            ));
        }

        info!(extraction_workers = workers, "Pipeline workers started");
        acquisition_tx
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
