//! Tile command - produce one tile and print its path.

use std::collections::HashMap;

use sentinel_tms::tile::TileOptions;
use tracing::info;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the tile command.
pub struct TileArgs {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub bands: Option<String>,
    pub first_clip: Option<String>,
    pub second_clip: Option<String>,
    pub third_clip: Option<String>,
    pub zone: Option<String>,
    pub date: Option<String>,
}

impl TileArgs {
    /// Options in the same form the HTTP endpoint receives them.
    fn query(&self) -> HashMap<String, String> {
        [
            ("bands", &self.bands),
            ("first_clip", &self.first_clip),
            ("second_clip", &self.second_clip),
            ("third_clip", &self.third_clip),
            ("zone", &self.zone),
            ("date", &self.date),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
    }
}

/// Run the tile command.
pub fn run(args: TileArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let tile_options = TileOptions::from_query(&args.query())?;

    let runner = CliRunner::new(options)?;
    runner.log_startup("tile");

    let app = runner.start_app()?;
    let runtime = runner.runtime()?;

    let result = runtime.block_on(app.orchestrator().generate_tile(
        args.x,
        args.y,
        args.z,
        &tile_options,
    ));

    app.shutdown();
    drop(runtime);

    let path = result?;
    info!(telemetry = %app.telemetry_snapshot(), "Tile ready");

    match image::image_dimensions(&path) {
        Ok((width, height)) => println!("{} ({}x{})", path.display(), width, height),
        Err(_) => println!("{}", path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> TileArgs {
        TileArgs {
            x: 8270,
            y: 5981,
            z: 14,
            bands: None,
            first_clip: None,
            second_clip: None,
            third_clip: None,
            zone: None,
            date: None,
        }
    }

    #[test]
    fn test_query_skips_absent_options() {
        assert!(args().query().is_empty());
    }

    #[test]
    fn test_query_matches_endpoint_keys() {
        let args = TileArgs {
            bands: Some("4,3,2".to_string()),
            third_clip: Some("0,4000".to_string()),
            date: Some("20240601".to_string()),
            ..args()
        };
        let query = args.query();
        assert_eq!(query.len(), 3);

        let options = TileOptions::from_query(&query).unwrap();
        assert_eq!(options.bands.indices(), [4, 3, 2]);
        assert_eq!(options.clips[2].max(), 4000.0);
        assert!(options.date.is_some());
    }
}
