use serde::Serialize;

use super::{ChannelsState, OverlaysState};

const DEFAULT_CHANNELS_OPACITY: f32 = 1.0;
const DEFAULT_OVERLAYS_FILL_OPACITY: f32 = 0.5;

/// Channel and overlay configuration shared by every panel pointing at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerState {
    pub channels: ChannelsState,
    pub overlays: OverlaysState,
    channels_opacity: f32,
    overlays_fill_opacity: f32,
    show_cell_outline: bool,
}

impl Default for LayerState {
    fn default() -> Self {
        Self::new(ChannelsState::default())
    }
}

impl LayerState {
    pub fn new(channels: ChannelsState) -> Self {
        Self {
            channels,
            overlays: OverlaysState::default(),
            channels_opacity: DEFAULT_CHANNELS_OPACITY,
            overlays_fill_opacity: DEFAULT_OVERLAYS_FILL_OPACITY,
            show_cell_outline: true,
        }
    }

    pub fn channels_opacity(&self) -> f32 {
        self.channels_opacity
    }

    pub fn overlays_fill_opacity(&self) -> f32 {
        self.overlays_fill_opacity
    }

    pub fn show_cell_outline(&self) -> bool {
        self.show_cell_outline
    }

    pub fn set_channels_opacity(&mut self, opacity: f32) {
        self.channels_opacity = clamp_opacity(opacity, self.channels_opacity);
    }

    pub fn set_overlays_fill_opacity(&mut self, opacity: f32) {
        self.overlays_fill_opacity = clamp_opacity(opacity, self.overlays_fill_opacity);
    }

    pub fn set_show_cell_outline(&mut self, show: bool) {
        self.show_cell_outline = show;
    }
}

// NaN keeps the previous value.
fn clamp_opacity(opacity: f32, current: f32) -> f32 {
    if opacity.is_nan() {
        current
    } else {
        opacity.clamp(0.0, 1.0)
    }
}
