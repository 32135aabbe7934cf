//! Configuration CLI commands.

use clap::Subcommand;

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, options: &GlobalOptions) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(options),
    }
}

fn run_path(options: &GlobalOptions) -> Result<(), CliError> {
    let path = options.config_path();
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{} (not created, defaults in use)", path.display());
    }
    Ok(())
}
