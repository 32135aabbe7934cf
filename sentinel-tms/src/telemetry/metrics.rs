//! Atomic pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::TelemetrySnapshot;

/// Shared counters updated by every pipeline component.
///
/// All methods take `&self`; share the struct through an `Arc`.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    cache_hits: AtomicU64,
    jobs_submitted: AtomicU64,
    jobs_coalesced: AtomicU64,
    acquisitions_completed: AtomicU64,
    acquisitions_failed: AtomicU64,
    tiles_written: AtomicU64,
    extractions_failed: AtomicU64,
    requests_timed_out: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request was answered from an existing tile file.
    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A new Job entered the acquisition queue.
    pub fn job_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// A request joined a Job already in flight instead of enqueuing one.
    pub fn job_coalesced(&self) {
        self.jobs_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn acquisition_completed(&self) {
        self.acquisitions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn acquisition_failed(&self) {
        self.acquisitions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_written(&self) {
        self.tiles_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn extraction_failed(&self) {
        self.extractions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A request gave up polling and answered "not yet ready".
    pub fn request_timed_out(&self) {
        self.requests_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_coalesced: self.jobs_coalesced.load(Ordering::Relaxed),
            acquisitions_completed: self.acquisitions_completed.load(Ordering::Relaxed),
            acquisitions_failed: self.acquisitions_failed.load(Ordering::Relaxed),
            tiles_written: self.tiles_written.load(Ordering::Relaxed),
            extractions_failed: self.extractions_failed.load(Ordering::Relaxed),
            requests_timed_out: self.requests_timed_out.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters_start_at_zero() {
        assert_eq!(PipelineMetrics::new().snapshot(), TelemetrySnapshot::default());
    }

    #[test]
    fn test_counters_record_events() {
        let metrics = PipelineMetrics::new();
        metrics.cache_hit();
        metrics.job_submitted();
        metrics.job_submitted();
        metrics.job_coalesced();
        metrics.acquisition_completed();
        metrics.tile_written();
        metrics.acquisition_failed();
        metrics.request_timed_out();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.jobs_submitted, 2);
        assert_eq!(snapshot.jobs_coalesced, 1);
        assert_eq!(snapshot.acquisitions_completed, 1);
        assert_eq!(snapshot.acquisitions_failed, 1);
        assert_eq!(snapshot.tiles_written, 1);
        assert_eq!(snapshot.extractions_failed, 0);
        assert_eq!(snapshot.requests_timed_out, 1);
    }

    #[test]
    fn test_counters_are_thread_safe() {
        let metrics = Arc::new(PipelineMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.job_submitted();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().jobs_submitted, 8000);
    }
}
