//! CLI error type.

use std::fmt;

use sentinel_tms::app::AppError;
use sentinel_tms::config::ConfigError;
use sentinel_tms::tile::{ErrorClass, TileError};
use sentinel_tms::zone::ZoneError;

/// Errors reported by CLI commands. Each one ends the process with a
/// non-zero exit code.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration or arguments.
    Config(String),

    /// The tile service failed to start.
    App(AppError),

    /// A tile request failed.
    Tile(TileError),

    /// Zone geometry could not be loaded.
    Zones(ZoneError),

    /// Tokio runtime creation failed.
    Runtime(String),

    /// The HTTP server failed.
    Server(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Tile(e) => {
                let class = match e.class() {
                    ErrorClass::DataCannotBeComputed => "cannot be computed",
                    ErrorClass::NotYetReady => "not ready yet, retry later",
                };
                write!(f, "Tile {}: {}", class, e)
            }
            CliError::Zones(e) => write!(f, "Failed to load zones: {}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Server(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Tile(e)
    }
}

impl From<ZoneError> for CliError {
    fn from(e: ZoneError) -> Self {
        CliError::Zones(e)
    }
}
