//! Logging setup.
//!
//! Console output goes to stderr. With `--log-file` a second, daily-rolling
//! file layer is added; its writer is non-blocking, so the returned guard
//! must live until the process exits.

use std::path::Path;

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::CliError;

/// Filter used when neither `RUST_LOG` nor `--verbose` is given.
pub const DEFAULT_FILTER: &str = "info";

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "info,sentinel_tms=debug,sentinel_tms_cli=debug";

/// Installs the global subscriber.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let console = fmt::layer()
        .with_timer(timer.clone())
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            std::fs::create_dir_all(dir).map_err(|e| {
                CliError::Config(format!("cannot create log directory {}: {}", dir.display(), e))
            })?;
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_timer(timer)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Config(format!("failed to initialise logging: {}", e)))?;

    Ok(guard)
}

/// Splits a log path into directory and file name prefix.
fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), CliError> {
    let name = path
        .file_name()
        .ok_or_else(|| CliError::Config(format!("invalid log file path {}", path.display())))?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/tms.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, "tms.log");

        let (dir, name) = split_log_path(Path::new("tms.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "tms.log");
    }

    #[test]
    fn test_split_log_path_rejects_directory_only() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
