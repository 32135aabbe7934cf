//! Point-in-time copy of the pipeline counters.

use std::fmt;

/// Counter values at the moment [`super::PipelineMetrics::snapshot`] ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub cache_hits: u64,
    pub jobs_submitted: u64,
    pub jobs_coalesced: u64,
    pub acquisitions_completed: u64,
    pub acquisitions_failed: u64,
    pub tiles_written: u64,
    pub extractions_failed: u64,
    pub requests_timed_out: u64,
}

impl TelemetrySnapshot {
    /// Jobs that left the pipeline, successfully or not.
    pub fn jobs_finished(&self) -> u64 {
        self.acquisitions_failed + self.tiles_written + self.extractions_failed
    }

    /// Jobs submitted but not finished yet.
    pub fn jobs_in_flight(&self) -> u64 {
        self.jobs_submitted.saturating_sub(self.jobs_finished())
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache hits {}, jobs {} submitted / {} coalesced / {} in flight, \
             acquisitions {} ok / {} failed, tiles {} written / {} failed, timeouts {}",
            self.cache_hits,
            self.jobs_submitted,
            self.jobs_coalesced,
            self.jobs_in_flight(),
            self.acquisitions_completed,
            self.acquisitions_failed,
            self.tiles_written,
            self.extractions_failed,
            self.requests_timed_out
        )
    }
}
