//! Sentinel TMS CLI - on-demand Sentinel-2 tile server
//!
//! ```text
//! sentinel-tms serve [--bind ADDR]
//! sentinel-tms tile X Y Z [--bands 2,3,4] [--zone 31TCJ] [--date 20240601] ...
//! sentinel-tms zone LON LAT
//! sentinel-tms config path
//! ```

mod commands;
mod error;
mod logging;
mod runner;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::serve::ServeArgs;
use commands::tile::TileArgs;
use commands::zone::ZoneArgs;
use error::CliError;
use runner::GlobalOptions;

#[derive(Debug, Parser)]
#[command(name = "sentinel-tms", version, about = "On-demand Sentinel-2 TMS tile server")]
struct Cli {
    /// Configuration file (default: ~/.sentinel-tms/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to a daily rotated file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve tiles over HTTP
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },

    /// Produce a single tile and print its path
    Tile {
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,
        /// Zoom level
        z: u32,

        /// Band triple, blue to red (e.g. 2,3,4)
        #[arg(long)]
        bands: Option<String>,

        /// Stretch window of the first band (min,max)
        #[arg(long, allow_hyphen_values = true)]
        first_clip: Option<String>,

        /// Stretch window of the second band (min,max)
        #[arg(long, allow_hyphen_values = true)]
        second_clip: Option<String>,

        /// Stretch window of the third band (min,max)
        #[arg(long, allow_hyphen_values = true)]
        third_clip: Option<String>,

        /// Expected zone name
        #[arg(long)]
        zone: Option<String>,

        /// Acquisition date (YYYYMMDD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Print the zone covering a point
    Zone {
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = GlobalOptions {
        config: cli.config,
        verbose: cli.verbose,
        log_file: cli.log_file,
    };

    match cli.command {
        Commands::Serve { bind } => commands::serve::run(ServeArgs { bind }, &options),
        Commands::Tile {
            x,
            y,
            z,
            bands,
            first_clip,
            second_clip,
            third_clip,
            zone,
            date,
        } => commands::tile::run(
            TileArgs {
                x,
                y,
                z,
                bands,
                first_clip,
                second_clip,
                third_clip,
                zone,
                date,
            },
            &options,
        ),
        Commands::Zone { lon, lat } => commands::zone::run(ZoneArgs { lon, lat }, &options),
        Commands::Config(command) => commands::config::run(command, &options),
    }
}
