use std::fs;

use clap::Parser;

use super::runner::execute;
use super::types::{Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments parse")
}

#[test]
fn tile_accepts_negative_zoom_and_repeated_markers() {
    let cli = parse(&[
        "slideview", "tile", "--resource", "s3://lab/cells.parquet", "--z", "-3", "--x", "0",
        "--y", "-1", "--marker", "CD3", "--marker", "CD8",
    ]);
    let Commands::Tile { z, y, markers, .. } = &cli.command else {
        panic!("expected tile command");
    };
    assert_eq!((*z, *y), (-3, -1));
    assert_eq!(markers, &["CD3".to_string(), "CD8".to_string()]);
}

#[test]
fn tile_report_contains_query() {
    let cli = parse(&[
        "slideview", "tile", "--resource", "/data/cells.parquet", "--z", "0", "--x", "1", "--y",
        "2", "--marker", "CD3",
    ]);
    let output = execute(None, cli.command).expect("report");
    let report: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(report["key"], "0/1/2");
    assert_eq!(report["mode"], "polygons");
    assert_eq!(report["bbox"]["min_x"], 512.0);
    assert!(
        report["text"]
            .as_str()
            .is_some_and(|text| text.contains("read_parquet('/data/cells.parquet')"))
    );
}

#[test]
fn invalid_resource_is_reported() {
    let cli = parse(&["slideview", "counts", "--resource", "cells.parquet"]);
    assert!(execute(None, cli.command).is_err());
}

#[test]
fn config_file_sets_tile_size() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("viewer.yaml");
    fs::write(&path, "tile_size: 512\n").expect("write config");

    let cli = parse(&["slideview", "--config", path.to_str().expect("utf-8 path"), "config"]);
    let output = execute(cli.config.as_deref(), cli.command).expect("config");
    let config: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(config["tile_size"], 512);
    assert_eq!(config["initialization_timeout_ms"], 10_000);
}
