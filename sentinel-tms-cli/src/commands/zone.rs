//! Zone command - look up the zone covering a point.

use std::path::Path;

use sentinel_tms::config::ConfigFile;
use sentinel_tms::zone::{load_zones_geojson, ZoneIndex};

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Arguments for the zone command.
pub struct ZoneArgs {
    pub lon: f64,
    pub lat: f64,
}

/// Run the zone command.
pub fn run(args: ZoneArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let config = ConfigFile::load_from(&options.config_path())?;
    let index = load_index(&config.zones.file, &config.zones.name_property)?;

    match index.find_zone(args.lon, args.lat) {
        Some(zone) => {
            println!("{}", zone.name());
            Ok(())
        }
        None => Err(CliError::Config(format!(
            "No zone covers ({}, {}) in {} ({} zones loaded)",
            args.lon,
            args.lat,
            config.zones.file.display(),
            index.len()
        ))),
    }
}

fn load_index(path: &Path, name_property: &str) -> Result<ZoneIndex, CliError> {
    Ok(ZoneIndex::new(load_zones_geojson(path, name_property)?))
}
