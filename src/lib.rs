pub mod cli;
pub mod config;
pub mod model;
pub mod query;
pub mod runtime;
pub mod sources;
pub mod state;
pub mod stats;
pub mod tiles;

pub fn run_cli() -> Result<(), String> {
    cli::run_cli()
}
