use serde_json::json;

use crate::model::{ByteDomain, ImageMetadata, Palette, PixelType, Rgb, Rgba};
use crate::query::SpatialQueryBuilder;
use crate::sources::{MarkerCounts, SourceError};
use crate::stats::{ChannelStats, estimate};
use crate::tiles::{TileIndex, TileLoadKind, TileMode};

use super::{
    ChannelStatus, ChannelsState, Effect, OverlayStatus, ViewerCommand, ViewerError, ViewerStore,
};

fn metadata() -> ImageMetadata {
    ImageMetadata::from_shape(&[1, 2, 1, 512, 512], PixelType::U16)
        .with_channel_names(["DAPI", "GFP"])
}

fn ten_sample_stats() -> ChannelStats {
    estimate(&(0..10).collect::<Vec<u32>>(), 16)
}

fn initialized_store() -> ViewerStore {
    let mut store = ViewerStore::default();
    store.set_metadata(metadata()).expect("metadata");
    let request = store.begin_initialization().expect("begin");
    assert_eq!(request.channel_id, "DAPI");
    let panel = store
        .complete_initialization(request.generation, Ok(ten_sample_stats()))
        .expect("complete");
    assert_eq!(panel, Some(0));
    store
}

fn counts() -> MarkerCounts {
    MarkerCounts {
        row_count: Some(120),
        markers: [("CD8".to_string(), 7), ("CD3".to_string(), 40)]
            .into_iter()
            .collect(),
    }
}

#[test]
fn first_initialization_populates_panel_zero() {
    let store = initialized_store();
    assert!(store.is_initialized());
    assert_eq!(store.image_panels(), &[0]);
    assert_eq!(store.layers_states().len(), 1);
    assert_eq!(store.image_panel_index(), Some(0));

    let channels = &store.active_layer().expect("layer").channels;
    assert_eq!(channels.channel_ids(), &["DAPI".to_string(), "GFP".to_string()]);
    assert_eq!(channels.selected_channel_id(), Some("DAPI"));

    let dapi = channels.get("DAPI").expect("dapi");
    assert!(dapi.is_visible && dapi.is_initialized && !dapi.is_loading);
    assert_eq!(dapi.domain, ByteDomain::new(0, 9));
    assert_eq!(dapi.contrast_limits_initial, ByteDomain::new(6, 8));

    let gfp = channels.get("GFP").expect("gfp");
    assert!(!gfp.is_visible && !gfp.is_initialized);
    assert_eq!(gfp.domain, ByteDomain::new(0, 65_536));
    assert_eq!(gfp.selection.c, 1);
    assert!(store.error().is_none());
}

#[test]
fn repeated_visibility_requests_share_one_fetch() {
    let mut store = initialized_store();
    let request = store
        .set_channel_visibility("GFP", true)
        .expect("toggle")
        .expect("fetch needed");
    assert_eq!(request.selection.c, 1);
    assert_eq!(request.bit_depth, 16);
    assert!(store.set_channel_visibility("GFP", true).expect("toggle").is_none());

    let channels = &store.active_layer().expect("layer").channels;
    assert_eq!(channels.get("GFP").expect("gfp").status(), ChannelStatus::Loading);

    assert_eq!(store.complete_channel_stats(request.ticket, Ok(ten_sample_stats())), 1);
    assert_eq!(store.complete_channel_stats(request.ticket, Ok(ten_sample_stats())), 0);
    let gfp = store.active_layer().expect("layer").channels.get("GFP").expect("gfp").clone();
    assert_eq!(gfp.status(), ChannelStatus::Initialized);
    assert!(gfp.is_visible);
}

#[test]
fn failed_fetch_hides_channel_and_allows_retry() {
    let mut store = initialized_store();
    let request = store
        .set_channel_visibility("GFP", true)
        .expect("toggle")
        .expect("fetch");
    let applied = store.complete_channel_stats(
        request.ticket,
        Err(SourceError::Raster("network down".to_string())),
    );
    assert_eq!(applied, 1);
    let gfp = store.active_layer().expect("layer").channels.get("GFP").expect("gfp").clone();
    assert!(!gfp.is_visible && !gfp.is_loading && !gfp.is_initialized);

    let retry = store.set_channel_visibility("GFP", true).expect("retry");
    assert!(retry.is_some_and(|retry| retry.ticket != request.ticket));
}

#[test]
fn visibility_without_fetch() {
    let mut store = initialized_store();
    assert!(store.set_channel_visibility("GFP", false).expect("hide").is_none());
    assert!(store.set_channel_visibility("DAPI", false).expect("hide").is_none());
    let channels = &store.active_layer().expect("layer").channels;
    assert!(!channels.get("DAPI").expect("dapi").is_visible);
    assert!(!channels.get("GFP").expect("gfp").is_loading);
    assert_eq!(channels.visible().count(), 0);

    let error = store.set_channel_visibility("RFP", true).expect_err("unknown");
    assert_eq!(error, ViewerError::UnknownChannel("RFP".to_string()));
}

#[test]
fn late_result_still_initializes_hidden_channel() {
    let mut store = initialized_store();
    let request = store.set_channel_visibility("GFP", true).expect("toggle").expect("fetch");
    assert!(store.set_channel_visibility("GFP", false).expect("hide").is_none());
    store.complete_channel_stats(request.ticket, Ok(ten_sample_stats()));
    let gfp = store.active_layer().expect("layer").channels.get("GFP").expect("gfp").clone();
    assert!(gfp.is_initialized);
}

#[test]
fn contrast_limits_apply_to_selected_channel() {
    let mut store = initialized_store();
    store.set_contrast_limits(ByteDomain::new(5, 100)).expect("set");
    let dapi = store.active_layer().expect("layer").channels.get("DAPI").expect("dapi").clone();
    assert_eq!(dapi.contrast_limits, ByteDomain::new(5, 9));
    assert_eq!(dapi.contrast_limits_initial, ByteDomain::new(6, 8));

    store.set_contrast_limits(ByteDomain::from([8, 2])).expect("set");
    let channels = &store.active_layer().expect("layer").channels;
    assert_eq!(channels.selected().expect("selected").contrast_limits, ByteDomain::new(2, 8));

    store.reset_contrast_limits().expect("reset");
    let channels = &store.active_layer().expect("layer").channels;
    assert_eq!(channels.selected().expect("selected").contrast_limits, ByteDomain::new(6, 8));

    store.select_channel("GFP").expect("select");
    store.set_contrast_limits(ByteDomain::new(100, 200)).expect("set");
    let channels = &store.active_layer().expect("layer").channels;
    assert_eq!(channels.get("GFP").expect("gfp").contrast_limits, ByteDomain::new(100, 200));
    assert_eq!(channels.get("DAPI").expect("dapi").contrast_limits, ByteDomain::new(6, 8));
}

#[test]
fn duplicated_layer_states_diverge() {
    let mut store = initialized_store();
    let slot = store.add_channels_state().expect("duplicate");
    assert_eq!(slot, 1);
    assert_eq!(store.image_panels(), &[1]);
    store.set_channel_color("DAPI", Rgb::new(1, 2, 3)).expect("color");
    let original = store.layer_state(0).expect("slot 0").channels.get("DAPI").expect("dapi");
    let copy = store.layer_state(1).expect("slot 1").channels.get("DAPI").expect("dapi");
    assert_ne!(original.color, copy.color);
    assert!(copy.is_initialized);
}

#[test]
fn duplicates_made_during_fetch_share_the_result() {
    let mut store = initialized_store();
    let request = store.set_channel_visibility("GFP", true).expect("toggle").expect("fetch");
    store.add_channels_state().expect("duplicate");
    assert_eq!(store.complete_channel_stats(request.ticket, Ok(ten_sample_stats())), 2);
    for layer in store.layers_states() {
        assert!(layer.channels.get("GFP").expect("gfp").is_initialized);
    }
}

#[test]
fn add_image_panel_grows_pool() {
    let mut store = initialized_store();
    let panel = store.add_image_panel();
    assert_eq!(panel, 1);
    assert_eq!(store.image_panels(), &[0, 1]);
    assert_eq!(store.layers_states().len(), 2);
    assert_eq!(store.image_panel_index(), Some(1));
    assert_eq!(store.layers_states()[0], store.layers_states()[1]);
    assert!(store.panels_are_consistent());
}

#[test]
fn add_image_panel_before_initialization_keeps_invariant() {
    let mut store = ViewerStore::default();
    assert_eq!(store.add_image_panel(), 0);
    assert!(store.panels_are_consistent());
    assert!(!store.is_initialized());
}

#[test]
fn remove_image_panel_activates_previous() {
    let mut store = initialized_store();
    store.add_image_panel();
    store.add_image_panel();
    store.remove_image_panel(2).expect("remove");
    assert_eq!(store.image_panel_index(), Some(1));
    store.remove_image_panel(0).expect("remove");
    assert_eq!(store.image_panel_index(), Some(0));
    assert_eq!(store.image_panels(), &[1]);
    store.remove_image_panel(0).expect("remove");
    assert_eq!(store.image_panel_index(), None);
    assert_eq!(store.remove_image_panel(0), Err(ViewerError::UnknownPanel(0)));
    assert!(store.panels_are_consistent());
}

#[test]
fn remove_channels_state_remaps_panels() {
    let mut store = initialized_store();
    store.set_active_channels_state_index(3).expect("grow");
    assert_eq!(store.layers_states().len(), 4);
    assert_eq!(store.image_panels(), &[3]);
    store.set_channel_color("GFP", Rgb::new(9, 9, 9)).expect("mark slot 3");

    store.remove_channels_state(0).expect("remove");
    assert_eq!(store.image_panels(), &[2]);
    let marked = store.active_layer().expect("layer").channels.get("GFP").expect("gfp");
    assert_eq!(marked.color, Rgb::new(9, 9, 9));

    store.remove_channels_state(2).expect("remove");
    assert_eq!(store.image_panels(), &[1]);
    store.remove_channels_state(0).expect("remove");
    assert_eq!(store.image_panels(), &[0]);
    assert_eq!(store.remove_channels_state(0), Err(ViewerError::LastLayerState));
    assert_eq!(store.remove_channels_state(4), Err(ViewerError::UnknownLayerState(4)));
    assert!(store.panels_are_consistent());
}

#[test]
fn removing_the_shown_slot_falls_to_its_successor() {
    let mut store = initialized_store();
    store.set_active_channels_state_index(2).expect("grow");
    store.set_channel_color("DAPI", Rgb::new(1, 2, 3)).expect("mark slot 2");
    store.set_active_channels_state_index(1).expect("select");

    store.remove_channels_state(1).expect("remove");
    assert_eq!(store.image_panels(), &[1]);
    let shown = store.active_layer().expect("layer").channels.get("DAPI").expect("dapi");
    assert_eq!(shown.color, Rgb::new(1, 2, 3));

    store.remove_channels_state(1).expect("remove");
    assert_eq!(store.image_panels(), &[0]);
    assert!(store.panels_are_consistent());
}

#[test]
fn repeated_channel_names_get_unique_ids() {
    let metadata = ImageMetadata::from_shape(&[1, 4, 1, 8, 8], PixelType::U8)
        .with_channel_names(["A", "A (2)", "A", "A"]);
    let channels = ChannelsState::discover(&metadata, &Palette::default());
    assert_eq!(channels.len(), 4);
    assert_eq!(channels.channel_ids(), &["A", "A (2)", "A (3)", "A (4)"]);
    assert_eq!(channels.get("A (3)").expect("third").selection.c, 2);
    assert_eq!(channels.get("A (4)").expect("fourth").selection.c, 3);
    assert_eq!(channels.selected_channel_id(), Some("A"));
}

#[test]
fn mixed_panel_operations_keep_indices_valid() {
    let mut store = initialized_store();
    let mut seed = 0x2545_f491_u64;
    for _ in 0..500 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let pick = (seed >> 33) as usize;
        match pick % 6 {
            0 => {
                store.add_image_panel();
            }
            1 => {
                let len = store.layers_states().len();
                let _ = store.remove_channels_state(pick % (len + 1));
            }
            2 => {
                let _ = store.set_active_channels_state_index(pick % 6);
            }
            3 => {
                let len = store.image_panels().len();
                if len > 1 {
                    store.remove_image_panel(pick % len).expect("remove panel");
                }
            }
            4 => {
                let _ = store.add_channels_state();
            }
            _ => {
                let len = store.image_panels().len();
                if len > 0 {
                    store.set_active_panel(pick % len).expect("activate");
                }
            }
        }
        assert!(store.panels_are_consistent(), "{:?}", store.image_panels());
    }
}

#[test]
fn timed_out_initialization_ignores_late_result() {
    let mut store = ViewerStore::default();
    store.set_metadata(metadata()).expect("metadata");
    let request = store.begin_initialization().expect("begin");
    let error = store.fail_initialization(
        request.generation,
        ViewerError::InitializationTimeout { timeout_ms: 10_000 },
    );
    assert!(error.is_viewer_wide());
    let late = store
        .complete_initialization(request.generation, Ok(ten_sample_stats()))
        .expect("stale result is not an error");
    assert_eq!(late, None);
    assert!(!store.is_initialized());
    assert!(store.layers_states().is_empty());
    assert!(matches!(
        store.error(),
        Some(ViewerError::InitializationTimeout { .. })
    ));
}

#[test]
fn failed_initialization_leaves_state_empty() {
    let mut store = ViewerStore::default();
    store.set_metadata(metadata()).expect("metadata");
    let request = store.begin_initialization().expect("begin");
    let error = store
        .complete_initialization(request.generation, Err(SourceError::Raster("404".into())))
        .expect_err("fails");
    assert!(matches!(error, ViewerError::StatsFetch { ref channel, .. } if channel == "DAPI"));
    assert!(store.image_panels().is_empty());
    assert_eq!(store.image_panel_index(), None);
    assert!(store.error().is_some());
    assert!(store.begin_initialization().is_ok());
}

#[test]
fn initialization_preconditions() {
    let mut store = ViewerStore::default();
    assert_eq!(store.begin_initialization(), Err(ViewerError::MissingMetadata));
    assert_eq!(store.error(), Some(&ViewerError::MissingMetadata));

    let invalid = ImageMetadata::from_shape(&[1, 1, 1, 4, 4], PixelType::U8);
    assert!(store.set_metadata(invalid).is_err());

    store.set_metadata(metadata()).expect("metadata");
    store.begin_initialization().expect("begin");
    assert_eq!(
        store.begin_initialization(),
        Err(ViewerError::InitializationInProgress)
    );
    assert_eq!(store.add_channels_state(), Err(ViewerError::NotInitialized));
}

#[test]
fn overlay_lifecycle() {
    let mut store = initialized_store();
    let error = store.add_overlay("cells", "not a locator").expect_err("invalid");
    assert!(matches!(error, ViewerError::InvalidResourceLocator(_)));
    assert!(store.error().is_some_and(ViewerError::is_viewer_wide));

    let request = store
        .add_overlay("cells", "s3://bucket/cells.parquet")
        .expect("add")
        .expect("count needed");
    assert!(store.add_overlay("cells", "s3://bucket/cells.parquet").expect("add").is_none());
    assert_eq!(store.complete_marker_counts(request.ticket, Ok(counts())), 1);

    let overlay = store
        .active_layer()
        .expect("layer")
        .overlays
        .get("cells")
        .expect("overlay")
        .clone();
    assert_eq!(overlay.status, OverlayStatus::Ready);
    assert_eq!(overlay.row_count, Some(120));
    assert_eq!(overlay.marker_order(), vec!["CD3".to_string(), "CD8".to_string()]);
    assert!(overlay.markers.values().all(|marker| !marker.is_visible));
    assert_eq!(overlay.markers["CD3"].count, 40);

    store.set_marker_visibility("cells", "CD8", true).expect("show");
    store
        .set_marker_color("cells", "CD8", Rgba::new(1, 1, 1, 255))
        .expect("color");
    let layer = store.active_layer().expect("layer");
    assert_eq!(layer.overlays.visible_mask("cells").expect("mask"), 0b10);

    store.set_all_markers_visibility("cells", true).expect("all");
    let layer = store.active_layer().expect("layer");
    assert_eq!(layer.overlays.visible_mask("cells").expect("mask"), 0b11);
    assert!(matches!(
        store.set_marker_visibility("cells", "CD4", true),
        Err(ViewerError::UnknownMarker { .. })
    ));
}

#[test]
fn overlay_tile_query_uses_canonical_marker_order() {
    let mut store = initialized_store();
    let request = store
        .add_overlay("cells", "s3://bucket/cells.parquet")
        .expect("add")
        .expect("count");
    store.complete_marker_counts(request.ticket, Ok(counts()));
    let query = store
        .overlay_tile_query("cells", TileIndex::new(-4, 0, 0), &SpatialQueryBuilder::default())
        .expect("query");
    assert_eq!(query.mode, TileMode::Points);
    assert_eq!(query.bitmask.bit_for("CD3"), Some(0));
    assert_eq!(query.bitmask.bit_for("CD8"), Some(1));
    assert!(
        store
            .overlay_tile_query("missing", TileIndex::new(0, 0, 0), &SpatialQueryBuilder::default())
            .is_err()
    );
}

#[test]
fn failed_counts_can_be_retried_and_removed_overlays_ignore_results() {
    let mut store = initialized_store();
    let first = store
        .add_overlay("cells", "/data/cells.parquet")
        .expect("add")
        .expect("count");
    store.complete_marker_counts(first.ticket, Err(SourceError::MarkerCount("denied".into())));
    let layer = store.active_layer().expect("layer");
    assert!(matches!(
        layer.overlays.get("cells").expect("overlay").status,
        OverlayStatus::Failed(_)
    ));

    let retry = store
        .add_overlay("cells", "/data/cells.parquet")
        .expect("add")
        .expect("retry");
    store.remove_overlay("cells").expect("remove");
    assert_eq!(store.complete_marker_counts(retry.ticket, Ok(counts())), 0);
    assert!(store.remove_overlay("cells").is_err());
}

#[test]
fn tile_trackers_are_per_panel() {
    let mut store = initialized_store();
    store.add_image_panel();
    store.set_active_channels_state_index(0).expect("link to slot 0");
    assert_eq!(store.image_panels(), &[0, 0]);

    assert_eq!(store.load_tile(0, TileLoadKind::Channels, "0/0/0").expect("load"), 1);
    assert_eq!(store.load_tile(0, TileLoadKind::Channels, "0/1/0").expect("load"), 2);
    assert_eq!(store.load_tile(1, TileLoadKind::Overlays, "0/0/0").expect("load"), 1);
    assert_eq!(store.channels_loading(1).expect("count"), 0);
    assert_eq!(store.finish_tile(0, TileLoadKind::Channels, "0/0/0").expect("finish"), 1);
    assert_eq!(store.finish_tile(0, TileLoadKind::Channels, "0/0/0").expect("finish"), 1);
    assert_eq!(store.finish_tile(0, TileLoadKind::Overlays, "0/0/0").expect("finish"), 0);
    assert_eq!(store.overlays_loading(1).expect("count"), 1);
    assert!(store.load_tile(5, TileLoadKind::Channels, "x").is_err());
}

#[test]
fn layer_settings_are_clamped() {
    let mut store = initialized_store();
    store.set_channels_opacity(1.5).expect("opacity");
    store.set_overlays_fill_opacity(-0.2).expect("fill");
    store.set_show_cell_outline(false).expect("outline");
    let layer = store.active_layer().expect("layer");
    assert_eq!(layer.channels_opacity(), 1.0);
    assert_eq!(layer.overlays_fill_opacity(), 0.0);
    assert!(!layer.show_cell_outline());

    store.set_channels_opacity(f32::NAN).expect("nan");
    assert_eq!(store.active_layer().expect("layer").channels_opacity(), 1.0);
}

#[test]
fn move_channel_reorders_display() {
    let mut store = initialized_store();
    store.move_channel("DAPI", 10).expect("move");
    let ids = store.active_layer().expect("layer").channels.channel_ids().to_vec();
    assert_eq!(ids, vec!["GFP".to_string(), "DAPI".to_string()]);
}

#[test]
fn commands_dispatch_from_json() {
    let mut store = ViewerStore::default();
    store.set_metadata(metadata()).expect("metadata");
    let init: ViewerCommand =
        serde_json::from_value(json!({"type": "add_channels_state"})).expect("command");
    let Effect::Initialize(request) = store.dispatch(init).expect("dispatch") else {
        panic!("expected initialization request");
    };
    store
        .complete_initialization(request.generation, Ok(ten_sample_stats()))
        .expect("complete");

    let commands: Vec<ViewerCommand> = serde_json::from_value(json!([
        {"type": "set_channel_visibility", "channel_id": "GFP", "visible": true},
        {"type": "add_channels_state"},
        {"type": "add_image_panel"},
        {"type": "set_contrast_limits", "limits": [1, 4]},
        {"type": "add_overlay", "overlay_id": "cells", "resource": "gs://b/cells.parquet"},
        {"type": "load_tile", "panel": 0, "kind": "overlays", "tile_id": "-3/0/0"}
    ]))
    .expect("commands");
    let effects = commands
        .into_iter()
        .map(|command| store.dispatch(command).expect("dispatch"))
        .collect::<Vec<_>>();
    assert!(matches!(effects[0], Effect::FetchChannelStats(_)));
    assert_eq!(effects[1], Effect::LayerStateAdded(1));
    assert_eq!(effects[2], Effect::PanelAdded(1));
    assert_eq!(effects[3], Effect::None);
    assert!(matches!(effects[4], Effect::FetchMarkerCounts(_)));
    assert_eq!(effects[5], Effect::TilesInFlight(1));
    assert!(store.panels_are_consistent());
}

#[test]
fn snapshot_serializes_state() {
    let mut store = initialized_store();
    store.load_tile(0, TileLoadKind::Channels, "0/0/0").expect("load");
    let snapshot = store.snapshot();
    assert!(snapshot.initialized);
    assert_eq!(snapshot.loading[0].channels, 1);
    let value = serde_json::to_value(&snapshot).expect("serialize");
    assert_eq!(value["image_panels"], json!([0]));
    assert_eq!(
        value["layers_states"][0]["channels"]["selected_channel_id"],
        json!("DAPI")
    );
    assert_eq!(
        value["layers_states"][0]["channels"]["channels"]["GFP"]["domain"],
        json!([0, 65536])
    );
}
