use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::query::TileQuery;

#[derive(Debug, Parser)]
#[command(
    name = "slideview",
    version,
    about = "Tile queries and viewer settings for multi-channel whole-slide images"
)]
pub(super) struct Cli {
    /// Viewer configuration file (JSON or YAML).
    #[arg(long, global = true)]
    pub(super) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Prints the bounding box, mode and query of one overlay tile.
    Tile {
        #[arg(long)]
        resource: String,
        #[arg(long, allow_hyphen_values = true)]
        z: i32,
        #[arg(long, allow_hyphen_values = true)]
        x: i64,
        #[arg(long, allow_hyphen_values = true)]
        y: i64,
        #[arg(long = "marker")]
        markers: Vec<String>,
        #[arg(long)]
        tile_size: Option<u32>,
    },
    /// Prints the aggregate queries used to count markers.
    Counts {
        #[arg(long)]
        resource: String,
        #[arg(long = "marker")]
        markers: Vec<String>,
    },
    /// Prints the effective viewer configuration.
    Config,
}

#[derive(Debug, Serialize)]
pub(super) struct TileReport {
    pub(super) key: String,
    pub(super) markers: Vec<String>,
    #[serde(flatten)]
    pub(super) query: TileQuery,
}

#[derive(Debug, Serialize)]
pub(super) struct CountsReport {
    pub(super) resource: String,
    pub(super) discover_markers: String,
    pub(super) count_markers: String,
}
