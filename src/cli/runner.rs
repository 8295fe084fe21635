use std::path::Path;

use clap::Parser;
use tracing::debug;

use crate::config::{ViewerConfig, load_config};
use crate::query::{
    ResourceLocator, SpatialQueryBuilder, boolean_columns_query, marker_count_query,
};
use crate::tiles::TileIndex;

use super::types::{Cli, Commands, CountsReport, TileReport};

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let output = execute(cli.config.as_deref(), cli.command)?;
    println!("{output}");
    Ok(())
}

pub(super) fn execute(config_path: Option<&Path>, command: Commands) -> Result<String, String> {
    let config = match config_path {
        Some(path) => load_config(path).map_err(|error| error.to_string())?,
        None => ViewerConfig::default(),
    };
    debug!(?config, "effective configuration");

    match command {
        Commands::Tile {
            resource,
            z,
            x,
            y,
            markers,
            tile_size,
        } => {
            let resource = ResourceLocator::parse(&resource).map_err(|error| error.to_string())?;
            let builder = SpatialQueryBuilder::new(tile_size.unwrap_or(config.tile_size));
            let tile = TileIndex::new(z, x, y);
            let query = builder.build(&resource, tile, &markers);
            let report = TileReport {
                key: tile.key(),
                markers: query.bitmask.columns().to_vec(),
                query,
            };
            serde_json::to_string_pretty(&report).map_err(|error| error.to_string())
        }
        Commands::Counts { resource, markers } => {
            let resource = ResourceLocator::parse(&resource).map_err(|error| error.to_string())?;
            let report = CountsReport {
                resource: resource.to_string(),
                discover_markers: boolean_columns_query(&resource),
                count_markers: marker_count_query(&resource, &markers),
            };
            serde_json::to_string_pretty(&report).map_err(|error| error.to_string())
        }
        Commands::Config => {
            serde_json::to_string_pretty(&config).map_err(|error| error.to_string())
        }
    }
}
