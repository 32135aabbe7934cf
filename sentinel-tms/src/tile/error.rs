//! Tile request error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// How a failed tile request should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Permanent: the tile cannot be produced for these parameters.
    DataCannotBeComputed,
    /// Transient: production is still running, retry later.
    NotYetReady,
}

/// Errors returned by `generate_tile`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No zone found at ({lon}, {lat})")]
    ZoneNotFound { lon: f64, lat: f64 },

    #[error("Tile spans zones {first} and {second}")]
    MultiZoneTile { first: String, second: String },

    #[error("Requested zone {requested} but tile lies in {resolved}")]
    ZoneMismatch { requested: String, resolved: String },

    #[error("No imagery date found for zone {0}")]
    NoDateFound(String),

    #[error("Tile {} not ready yet", .0.display())]
    NotYetReady(PathBuf),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TileError {
    /// Classification used at the dispatch boundary.
    pub fn class(&self) -> ErrorClass {
        match self {
            TileError::NotYetReady(_) => ErrorClass::NotYetReady,
            TileError::InvalidRequest(_)
            | TileError::ZoneNotFound { .. }
            | TileError::MultiZoneTile { .. }
            | TileError::ZoneMismatch { .. }
            | TileError::NoDateFound(_)
            | TileError::Internal(_) => ErrorClass::DataCannotBeComputed,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::NotYetReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            TileError::InvalidRequest("zoom 8".to_string()).class(),
            ErrorClass::DataCannotBeComputed
        );
        assert_eq!(
            TileError::ZoneMismatch {
                requested: "31TCJ".to_string(),
                resolved: "31THR".to_string()
            }
            .class(),
            ErrorClass::DataCannotBeComputed
        );
        assert_eq!(
            TileError::NoDateFound("31TCJ".to_string()).class(),
            ErrorClass::DataCannotBeComputed
        );
        assert_eq!(
            TileError::NotYetReady(PathBuf::from("/tmp/t.png")).class(),
            ErrorClass::NotYetReady
        );
        assert!(TileError::NotYetReady(PathBuf::from("/tmp/t.png")).is_retryable());
        assert!(!TileError::Internal("join".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = TileError::MultiZoneTile {
            first: "31TCJ".to_string(),
            second: "31TDJ".to_string(),
        };
        assert_eq!(err.to_string(), "Tile spans zones 31TCJ and 31TDJ");

        let err = TileError::NotYetReady(PathBuf::from("/cache/a.png"));
        assert_eq!(err.to_string(), "Tile /cache/a.png not ready yet");
    }
}
