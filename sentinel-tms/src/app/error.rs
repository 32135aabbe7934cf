//! Application error types.

use std::fmt;
use std::path::PathBuf;

use crate::provider::ProviderError;
use crate::zone::ZoneError;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// A cache directory could not be created.
    CacheDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The zone file could not be loaded.
    Zones(ZoneError),

    /// The HTTP client could not be created.
    HttpClient(ProviderError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::CacheDirectory { path, source } => {
                write!(
                    f,
                    "Failed to create cache directory {}: {}",
                    path.display(),
                    source
                )
            }
            AppError::Zones(e) => write!(f, "Failed to load zones: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::CacheDirectory { source, .. } => Some(source),
            AppError::Zones(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<ZoneError> for AppError {
    fn from(e: ZoneError) -> Self {
        AppError::Zones(e)
    }
}
