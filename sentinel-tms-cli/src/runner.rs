//! Shared setup for commands that run the tile service.

use std::path::PathBuf;

use sentinel_tms::app::{AppConfig, TileServiceApp};
use sentinel_tms::config::{config_file_path, ConfigFile};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::error::CliError;
use crate::logging::init_logging;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl GlobalOptions {
    /// Config file in use: `--config` or the per-user default.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }
}

/// Loaded configuration plus installed logging.
pub struct CliRunner {
    config: ConfigFile,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = ConfigFile::load_from(&options.config_path())?;
        let log_guard = init_logging(options.verbose, options.log_file.as_deref())?;
        Ok(Self {
            config,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = sentinel_tms::VERSION,
            command,
            config = %self.config.path.display(),
            "sentinel-tms starting"
        );
    }

    /// Starts the tile service. Blocking; call before entering the runtime.
    pub fn start_app(&self) -> Result<TileServiceApp, CliError> {
        Ok(TileServiceApp::start(AppConfig::from_config_file(&self.config))?)
    }

    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))
    }
}
