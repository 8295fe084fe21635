use serde::{Deserialize, Serialize};

use crate::model::{ByteDomain, Rgb, Rgba};
use crate::tiles::TileLoadKind;

use super::{
    ChannelId, InitRequest, MarkerCountRequest, MarkerId, OverlayId, Result, StatsRequest,
    ViewerStore,
};

/// Every mutation a UI shell can request, applied through [`ViewerStore::dispatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerCommand {
    AddImagePanel,
    RemoveImagePanel {
        index: usize,
    },
    SetActivePanel {
        index: usize,
    },
    AddChannelsState,
    RemoveChannelsState {
        index: usize,
    },
    SetActiveChannelsStateIndex {
        index: usize,
    },
    SetChannelVisibility {
        channel_id: ChannelId,
        visible: bool,
    },
    SelectChannel {
        channel_id: ChannelId,
    },
    SetChannelColor {
        channel_id: ChannelId,
        color: Rgb,
    },
    MoveChannel {
        channel_id: ChannelId,
        to: usize,
    },
    SetContrastLimits {
        limits: ByteDomain,
    },
    ResetContrastLimits,
    SetChannelsOpacity {
        opacity: f32,
    },
    SetOverlaysFillOpacity {
        opacity: f32,
    },
    SetShowCellOutline {
        show: bool,
    },
    AddOverlay {
        overlay_id: OverlayId,
        resource: String,
    },
    RemoveOverlay {
        overlay_id: OverlayId,
    },
    SetMarkerVisibility {
        overlay_id: OverlayId,
        marker_id: MarkerId,
        visible: bool,
    },
    SetMarkerColor {
        overlay_id: OverlayId,
        marker_id: MarkerId,
        color: Rgba,
    },
    SetAllMarkersVisibility {
        overlay_id: OverlayId,
        visible: bool,
    },
    LoadTile {
        panel: usize,
        kind: TileLoadKind,
        tile_id: String,
    },
    FinishTile {
        panel: usize,
        kind: TileLoadKind,
        tile_id: String,
    },
}

/// Follow-up work a command leaves for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    PanelAdded(usize),
    LayerStateAdded(usize),
    TilesInFlight(usize),
    Initialize(InitRequest),
    FetchChannelStats(StatsRequest),
    FetchMarkerCounts(MarkerCountRequest),
}

impl ViewerStore {
    pub fn dispatch(&mut self, command: ViewerCommand) -> Result<Effect> {
        let effect = match command {
            ViewerCommand::AddImagePanel => Effect::PanelAdded(self.add_image_panel()),
            ViewerCommand::RemoveImagePanel { index } => {
                self.remove_image_panel(index)?;
                Effect::None
            }
            ViewerCommand::SetActivePanel { index } => {
                self.set_active_panel(index)?;
                Effect::None
            }
            ViewerCommand::AddChannelsState if !self.is_initialized() => {
                Effect::Initialize(self.begin_initialization()?)
            }
            ViewerCommand::AddChannelsState => Effect::LayerStateAdded(self.add_channels_state()?),
            ViewerCommand::RemoveChannelsState { index } => {
                self.remove_channels_state(index)?;
                Effect::None
            }
            ViewerCommand::SetActiveChannelsStateIndex { index } => {
                self.set_active_channels_state_index(index)?;
                Effect::None
            }
            ViewerCommand::SetChannelVisibility {
                channel_id,
                visible,
            } => self
                .set_channel_visibility(&channel_id, visible)?
                .map_or(Effect::None, Effect::FetchChannelStats),
            ViewerCommand::SelectChannel { channel_id } => {
                self.select_channel(&channel_id)?;
                Effect::None
            }
            ViewerCommand::SetChannelColor { channel_id, color } => {
                self.set_channel_color(&channel_id, color)?;
                Effect::None
            }
            ViewerCommand::MoveChannel { channel_id, to } => {
                self.move_channel(&channel_id, to)?;
                Effect::None
            }
            ViewerCommand::SetContrastLimits { limits } => {
                self.set_contrast_limits(limits)?;
                Effect::None
            }
            ViewerCommand::ResetContrastLimits => {
                self.reset_contrast_limits()?;
                Effect::None
            }
            ViewerCommand::SetChannelsOpacity { opacity } => {
                self.set_channels_opacity(opacity)?;
                Effect::None
            }
            ViewerCommand::SetOverlaysFillOpacity { opacity } => {
                self.set_overlays_fill_opacity(opacity)?;
                Effect::None
            }
            ViewerCommand::SetShowCellOutline { show } => {
                self.set_show_cell_outline(show)?;
                Effect::None
            }
            ViewerCommand::AddOverlay {
                overlay_id,
                resource,
            } => self
                .add_overlay(&overlay_id, &resource)?
                .map_or(Effect::None, Effect::FetchMarkerCounts),
            ViewerCommand::RemoveOverlay { overlay_id } => {
                self.remove_overlay(&overlay_id)?;
                Effect::None
            }
            ViewerCommand::SetMarkerVisibility {
                overlay_id,
                marker_id,
                visible,
            } => {
                self.set_marker_visibility(&overlay_id, &marker_id, visible)?;
                Effect::None
            }
            ViewerCommand::SetMarkerColor {
                overlay_id,
                marker_id,
                color,
            } => {
                self.set_marker_color(&overlay_id, &marker_id, color)?;
                Effect::None
            }
            ViewerCommand::SetAllMarkersVisibility {
                overlay_id,
                visible,
            } => {
                self.set_all_markers_visibility(&overlay_id, visible)?;
                Effect::None
            }
            ViewerCommand::LoadTile {
                panel,
                kind,
                tile_id,
            } => Effect::TilesInFlight(self.load_tile(panel, kind, &tile_id)?),
            ViewerCommand::FinishTile {
                panel,
                kind,
                tile_id,
            } => Effect::TilesInFlight(self.finish_tile(panel, kind, &tile_id)?),
        };
        Ok(effect)
    }
}
