//! Orchestrator configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::coord::{MAX_ZOOM, MIN_ZOOM};

/// Default wait between two checks for a produced tile.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of checks before answering "not yet ready".
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Settings of [`super::TileOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Directory holding produced tiles.
    pub tiles_dir: PathBuf,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl OrchestratorConfig {
    pub fn new(tiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            tiles_dir: tiles_dir.into(),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn tiles_dir(&self) -> &Path {
        &self.tiles_dir
    }

    /// Longest time a request waits for its tile.
    pub fn max_wait(&self) -> Duration {
        self.poll_interval * self.max_poll_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::new("/tmp/tiles");
        assert_eq!(config.tiles_dir(), Path::new("/tmp/tiles"));
        assert_eq!((config.min_zoom, config.max_zoom), (9, 14));
        assert_eq!(config.max_wait(), Duration::from_secs(60));
    }

    #[test]
    fn test_builders() {
        let config = OrchestratorConfig::new("tiles")
            .with_zoom_range(5, 16)
            .with_poll_interval(Duration::from_millis(250))
            .with_max_poll_attempts(8);
        assert_eq!((config.min_zoom, config.max_zoom), (5, 16));
        assert_eq!(config.max_wait(), Duration::from_secs(2));
    }
}
