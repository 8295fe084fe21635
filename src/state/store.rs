use std::mem;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::model::{ByteDomain, CoreError, ImageMetadata, Palette, Rgb, Rgba};
use crate::query::{ResourceLocator, SpatialQueryBuilder, TileQuery};
use crate::sources::{MarkerCounts, SourceError};
use crate::stats::ChannelStats;
use crate::tiles::{PanelLoading, TileIndex, TileLoadKind};

use super::{
    ChannelId, ChannelsState, InitRequest, LayerState, MarkerCountRequest, Result, StatsRequest,
    ViewerError, VisibilityChange,
};

#[derive(Debug, Clone, Default)]
enum InitPhase {
    #[default]
    Idle,
    Pending {
        generation: u64,
        channel_id: ChannelId,
        channels: ChannelsState,
    },
    Ready,
}

/// Viewer state for one open image.
///
/// Panels hold indices into a pool of layer states; several panels may point
/// at the same slot. After every mutation each panel index is valid for the
/// pool. Asynchronous work leaves the store as request values carrying a
/// ticket, and results are applied back by ticket, so late answers for
/// removed or re-requested state are dropped.
#[derive(Debug, Clone)]
pub struct ViewerStore {
    palette: Palette,
    histogram_bit_depth: Option<u8>,
    metadata: Option<ImageMetadata>,
    image_panels: Vec<usize>,
    layers_states: Vec<LayerState>,
    panel_loading: Vec<PanelLoading>,
    image_panel_index: Option<usize>,
    initialization: InitPhase,
    next_ticket: u64,
    error: Option<ViewerError>,
}

impl Default for ViewerStore {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl ViewerStore {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            palette: config.palette(),
            histogram_bit_depth: config.histogram_bit_depth,
            metadata: None,
            image_panels: Vec::new(),
            layers_states: Vec::new(),
            panel_loading: Vec::new(),
            image_panel_index: None,
            initialization: InitPhase::Idle,
            next_ticket: 0,
            error: None,
        }
    }

    pub fn set_metadata(&mut self, metadata: ImageMetadata) -> Result<()> {
        if let Err(error) = metadata.validate() {
            let error = ViewerError::from(error);
            self.record_error(error.clone());
            return Err(error);
        }
        self.metadata = Some(metadata);
        Ok(())
    }

    pub fn metadata(&self) -> Option<&ImageMetadata> {
        self.metadata.as_ref()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.initialization, InitPhase::Ready)
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self.initialization, InitPhase::Pending { .. })
    }

    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn record_error(&mut self, error: ViewerError) {
        warn!(%error, "viewer error");
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn image_panels(&self) -> &[usize] {
        &self.image_panels
    }

    pub fn layers_states(&self) -> &[LayerState] {
        &self.layers_states
    }

    pub fn layer_state(&self, index: usize) -> Option<&LayerState> {
        self.layers_states.get(index)
    }

    pub fn image_panel_index(&self) -> Option<usize> {
        self.image_panel_index
    }

    /// Layer state index behind the active panel.
    pub fn active_layer_index(&self) -> Result<usize> {
        let panel = self.image_panel_index.ok_or(ViewerError::NoActivePanel)?;
        self.image_panels
            .get(panel)
            .copied()
            .ok_or(ViewerError::UnknownPanel(panel))
    }

    pub fn active_layer(&self) -> Result<&LayerState> {
        let index = self.active_layer_index()?;
        self.layers_states
            .get(index)
            .ok_or(ViewerError::UnknownLayerState(index))
    }

    fn active_layer_mut(&mut self) -> Result<&mut LayerState> {
        let index = self.active_layer_index()?;
        self.layers_states
            .get_mut(index)
            .ok_or(ViewerError::UnknownLayerState(index))
    }

    /// Every panel points at an existing layer state and has its own trackers.
    pub fn panels_are_consistent(&self) -> bool {
        self.image_panels
            .iter()
            .all(|layer| *layer < self.layers_states.len())
            && self.panel_loading.len() == self.image_panels.len()
            && self
                .image_panel_index
                .is_none_or(|panel| panel < self.image_panels.len())
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn bit_depth(&self) -> u8 {
        self.histogram_bit_depth.unwrap_or_else(|| {
            self.metadata
                .as_ref()
                .map(|metadata| metadata.pixel_type.bit_depth())
                .unwrap_or(16)
        })
    }

    // Panels

    /// Appends a panel backed by slot `panels.len()`, growing the pool from its last entry.
    pub fn add_image_panel(&mut self) -> usize {
        let slot = self.image_panels.len();
        if self.layers_states.is_empty() {
            self.layers_states.push(LayerState::default());
        }
        while self.layers_states.len() <= slot {
            let last = self.layers_states[self.layers_states.len() - 1].clone();
            self.layers_states.push(last);
        }
        self.image_panels.push(slot);
        self.panel_loading.push(PanelLoading::default());
        let panel = self.image_panels.len() - 1;
        self.image_panel_index = Some(panel);
        debug!(panel, slot, "image panel added");
        panel
    }

    /// Removes panel `index`; the panel before it becomes active.
    pub fn remove_image_panel(&mut self, index: usize) -> Result<()> {
        if index >= self.image_panels.len() {
            return Err(ViewerError::UnknownPanel(index));
        }
        self.image_panels.remove(index);
        self.panel_loading.remove(index);
        self.image_panel_index = match self.image_panels.len() {
            0 => None,
            len => Some(index.saturating_sub(1).min(len - 1)),
        };
        debug!(index, active = ?self.image_panel_index, "image panel removed");
        Ok(())
    }

    pub fn set_active_panel(&mut self, index: usize) -> Result<()> {
        if index >= self.image_panels.len() {
            return Err(ViewerError::UnknownPanel(index));
        }
        self.image_panel_index = Some(index);
        Ok(())
    }

    // Initialization

    /// Discovers channels and asks for the first channel's statistics.
    pub fn begin_initialization(&mut self) -> Result<InitRequest> {
        match self.initialization {
            InitPhase::Ready => return Err(ViewerError::AlreadyInitialized),
            InitPhase::Pending { .. } => return Err(ViewerError::InitializationInProgress),
            InitPhase::Idle => {}
        }
        let Some(metadata) = &self.metadata else {
            self.record_error(ViewerError::MissingMetadata);
            return Err(ViewerError::MissingMetadata);
        };
        let channels = ChannelsState::discover(metadata, &self.palette);
        let Some((channel_id, config)) = channels.first_channel() else {
            let error = ViewerError::InvalidMetadata(CoreError::NoChannels);
            self.record_error(error.clone());
            return Err(error);
        };
        let channel_id = channel_id.clone();
        let selection = config.selection;

        let generation = self.issue_ticket();
        let request = InitRequest {
            generation,
            channel_id: channel_id.clone(),
            selection,
            bit_depth: self.bit_depth(),
        };
        info!(
            channels = channels.len(),
            first = %channel_id,
            generation,
            "initializing viewer"
        );
        self.error = None;
        self.initialization = InitPhase::Pending {
            generation,
            channel_id,
            channels,
        };
        Ok(request)
    }

    /// Applies the first-channel outcome of `generation`.
    ///
    /// Returns `Ok(None)` when that generation is no longer pending, for
    /// instance because it already timed out.
    pub fn complete_initialization(
        &mut self,
        generation: u64,
        outcome: std::result::Result<ChannelStats, SourceError>,
    ) -> Result<Option<usize>> {
        let (channel_id, mut channels) = match mem::take(&mut self.initialization) {
            InitPhase::Pending {
                generation: pending,
                channel_id,
                channels,
            } if pending == generation => (channel_id, channels),
            other => {
                self.initialization = other;
                warn!(generation, "ignoring stale initialization result");
                return Ok(None);
            }
        };

        let stats = match outcome {
            Ok(stats) => stats,
            Err(source) => {
                let error = ViewerError::StatsFetch {
                    channel: channel_id,
                    source,
                };
                self.record_error(error.clone());
                return Err(error);
            }
        };
        channels.initialize_with(&channel_id, &stats)?;

        self.layers_states = vec![LayerState::new(channels)];
        self.image_panels = vec![0];
        self.panel_loading = vec![PanelLoading::default()];
        self.image_panel_index = Some(0);
        self.initialization = InitPhase::Ready;
        self.error = None;
        info!(channel = %channel_id, "viewer initialized");
        Ok(Some(0))
    }

    /// Abandons `generation` with `error`, if it is still pending.
    pub fn fail_initialization(&mut self, generation: u64, error: ViewerError) -> ViewerError {
        match &self.initialization {
            InitPhase::Pending {
                generation: pending,
                ..
            } if *pending == generation => {
                self.initialization = InitPhase::Idle;
                self.record_error(error.clone());
            }
            _ => warn!(generation, %error, "ignoring failure for stale initialization"),
        }
        error
    }

    // Layer states

    /// Copies the active panel's layer state into a new slot and points the panel at it.
    pub fn add_channels_state(&mut self) -> Result<usize> {
        if !self.is_initialized() {
            return Err(ViewerError::NotInitialized);
        }
        let panel = self.image_panel_index.ok_or(ViewerError::NoActivePanel)?;
        let duplicate = self.active_layer()?.clone();
        self.layers_states.push(duplicate);
        let slot = self.layers_states.len() - 1;
        self.image_panels[panel] = slot;
        debug!(panel, slot, "layer state duplicated");
        Ok(slot)
    }

    /// Removes slot `index` and remaps the panels.
    ///
    /// Panels behind the removed slot shift down by one, so they keep showing
    /// the same layer state instead of only being clamped. A panel on the
    /// removed slot takes its successor, and every index is then clamped to the
    /// shrunken pool.
    pub fn remove_channels_state(&mut self, index: usize) -> Result<()> {
        if index >= self.layers_states.len() {
            return Err(ViewerError::UnknownLayerState(index));
        }
        if self.layers_states.len() == 1 {
            return Err(ViewerError::LastLayerState);
        }
        self.layers_states.remove(index);
        let last = self.layers_states.len() - 1;
        for slot in &mut self.image_panels {
            if *slot > index {
                *slot -= 1;
            }
            *slot = (*slot).min(last);
        }
        debug!(index, panels = ?self.image_panels, "layer state removed");
        Ok(())
    }

    /// Points the active panel at slot `index`, duplicating the last slot until it exists.
    pub fn set_active_channels_state_index(&mut self, index: usize) -> Result<()> {
        let panel = self.image_panel_index.ok_or(ViewerError::NoActivePanel)?;
        let Some(last) = self.layers_states.last().cloned() else {
            return Err(ViewerError::NotInitialized);
        };
        while self.layers_states.len() <= index {
            self.layers_states.push(last.clone());
        }
        self.image_panels[panel] = index;
        Ok(())
    }

    // Channels

    /// Shows or hides a channel of the active layer state.
    ///
    /// Returns a request when the channel's statistics must be fetched first;
    /// repeated requests while that fetch is in flight return `None`.
    pub fn set_channel_visibility(
        &mut self,
        channel_id: &str,
        visible: bool,
    ) -> Result<Option<StatsRequest>> {
        let layer = self.active_layer_index()?;
        let ticket = self.issue_ticket();
        let bit_depth = self.bit_depth();
        let change = self
            .layers_states
            .get_mut(layer)
            .ok_or(ViewerError::UnknownLayerState(layer))?
            .channels
            .request_visibility(channel_id, visible, ticket)?;
        Ok(match change {
            VisibilityChange::FetchStats { selection } => Some(StatsRequest {
                ticket,
                layer,
                channel_id: channel_id.to_string(),
                selection,
                bit_depth,
            }),
            VisibilityChange::Applied | VisibilityChange::Coalesced | VisibilityChange::Ignored => {
                None
            }
        })
    }

    /// Applies stats fetch `ticket` to every layer state still waiting on it.
    ///
    /// Duplicates made while the fetch was in flight share the ticket and are
    /// updated too. Returns the number of layer states updated.
    pub fn complete_channel_stats(
        &mut self,
        ticket: u64,
        outcome: std::result::Result<ChannelStats, SourceError>,
    ) -> usize {
        let outcome = outcome.as_ref();
        let applied = self
            .layers_states
            .iter_mut()
            .map(|layer| layer.channels.complete_stats(ticket, outcome))
            .filter(|applied| *applied)
            .count();
        if applied == 0 {
            debug!(ticket, "stats result has no waiting channel");
        }
        applied
    }

    pub fn select_channel(&mut self, channel_id: &str) -> Result<()> {
        self.active_layer_mut()?.channels.select(channel_id)
    }

    pub fn set_channel_color(&mut self, channel_id: &str, color: Rgb) -> Result<()> {
        self.active_layer_mut()?.channels.set_color(channel_id, color)
    }

    pub fn move_channel(&mut self, channel_id: &str, to: usize) -> Result<()> {
        self.active_layer_mut()?.channels.move_channel(channel_id, to)
    }

    pub fn set_contrast_limits(&mut self, limits: ByteDomain) -> Result<()> {
        self.active_layer_mut()?.channels.set_contrast_limits(limits);
        Ok(())
    }

    pub fn reset_contrast_limits(&mut self) -> Result<()> {
        self.active_layer_mut()?.channels.reset_contrast_limits();
        Ok(())
    }

    pub fn set_channels_opacity(&mut self, opacity: f32) -> Result<()> {
        self.active_layer_mut()?.set_channels_opacity(opacity);
        Ok(())
    }

    pub fn set_overlays_fill_opacity(&mut self, opacity: f32) -> Result<()> {
        self.active_layer_mut()?.set_overlays_fill_opacity(opacity);
        Ok(())
    }

    pub fn set_show_cell_outline(&mut self, show: bool) -> Result<()> {
        self.active_layer_mut()?.set_show_cell_outline(show);
        Ok(())
    }

    // Overlays

    /// Attaches an overlay dataset to the active layer state.
    ///
    /// A malformed locator is rejected before anything else and recorded as
    /// a viewer-wide error.
    pub fn add_overlay(
        &mut self,
        overlay_id: &str,
        resource: &str,
    ) -> Result<Option<MarkerCountRequest>> {
        let resource = match ResourceLocator::parse(resource) {
            Ok(resource) => resource,
            Err(error) => {
                let error = ViewerError::from(error);
                self.record_error(error.clone());
                return Err(error);
            }
        };
        let layer = self.active_layer_index()?;
        let ticket = self.issue_ticket();
        let needs_counts = self
            .layers_states
            .get_mut(layer)
            .ok_or(ViewerError::UnknownLayerState(layer))?
            .overlays
            .add_overlay(overlay_id, resource.clone(), ticket);
        Ok(needs_counts.then(|| MarkerCountRequest {
            ticket,
            layer,
            overlay_id: overlay_id.to_string(),
            resource,
        }))
    }

    pub fn complete_marker_counts(
        &mut self,
        ticket: u64,
        outcome: std::result::Result<MarkerCounts, SourceError>,
    ) -> usize {
        let outcome = outcome.as_ref();
        let palette = &self.palette;
        self.layers_states
            .iter_mut()
            .map(|layer| {
                layer
                    .overlays
                    .complete_marker_counts(ticket, outcome, palette)
            })
            .filter(|applied| *applied)
            .count()
    }

    pub fn remove_overlay(&mut self, overlay_id: &str) -> Result<()> {
        self.active_layer_mut()?.overlays.remove_overlay(overlay_id)?;
        Ok(())
    }

    pub fn set_marker_visibility(
        &mut self,
        overlay_id: &str,
        marker_id: &str,
        visible: bool,
    ) -> Result<()> {
        self.active_layer_mut()?
            .overlays
            .set_marker_visibility(overlay_id, marker_id, visible)
    }

    pub fn set_marker_color(&mut self, overlay_id: &str, marker_id: &str, color: Rgba) -> Result<()> {
        self.active_layer_mut()?
            .overlays
            .set_marker_color(overlay_id, marker_id, color)
    }

    pub fn set_all_markers_visibility(&mut self, overlay_id: &str, visible: bool) -> Result<()> {
        self.active_layer_mut()?
            .overlays
            .set_all_markers_visibility(overlay_id, visible)
    }

    /// Query for `tile` of an overlay on the active layer state, encoding
    /// every marker in canonical order so masks stay comparable across tiles.
    pub fn overlay_tile_query(
        &self,
        overlay_id: &str,
        tile: TileIndex,
        builder: &SpatialQueryBuilder,
    ) -> Result<TileQuery> {
        let overlay = self
            .active_layer()?
            .overlays
            .get(overlay_id)
            .ok_or_else(|| ViewerError::UnknownOverlay(overlay_id.to_string()))?;
        Ok(builder.build(&overlay.resource, tile, &overlay.marker_order()))
    }

    // Tile loading

    pub fn load_tile(&mut self, panel: usize, kind: TileLoadKind, tile_id: &str) -> Result<usize> {
        Ok(self
            .panel_loading_mut(panel)?
            .tracker_mut(kind)
            .load_tile(tile_id))
    }

    pub fn finish_tile(&mut self, panel: usize, kind: TileLoadKind, tile_id: &str) -> Result<usize> {
        Ok(self
            .panel_loading_mut(panel)?
            .tracker_mut(kind)
            .finish_tile(tile_id))
    }

    pub fn panel_loading(&self, panel: usize) -> Result<&PanelLoading> {
        self.panel_loading
            .get(panel)
            .ok_or(ViewerError::UnknownPanel(panel))
    }

    pub fn channels_loading(&self, panel: usize) -> Result<usize> {
        Ok(self.panel_loading(panel)?.channels_loading())
    }

    pub fn overlays_loading(&self, panel: usize) -> Result<usize> {
        Ok(self.panel_loading(panel)?.overlays_loading())
    }

    fn panel_loading_mut(&mut self, panel: usize) -> Result<&mut PanelLoading> {
        self.panel_loading
            .get_mut(panel)
            .ok_or(ViewerError::UnknownPanel(panel))
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            initialized: self.is_initialized(),
            image_panels: self.image_panels.clone(),
            image_panel_index: self.image_panel_index,
            layers_states: self.layers_states.clone(),
            loading: self
                .panel_loading
                .iter()
                .map(|loading| LoadingSnapshot {
                    channels: loading.channels_loading(),
                    overlays: loading.overlays_loading(),
                })
                .collect(),
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingSnapshot {
    pub channels: usize,
    pub overlays: usize,
}

/// Serializable view of the store for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub initialized: bool,
    pub image_panels: Vec<usize>,
    pub image_panel_index: Option<usize>,
    pub layers_states: Vec<LayerState>,
    pub loading: Vec<LoadingSnapshot>,
    pub error: Option<String>,
}
