use crate::model::Selection;
use crate::query::ResourceLocator;

use super::{ChannelId, OverlayId};

/// Statistics fetch for one channel, answered with [`super::ViewerStore::complete_channel_stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRequest {
    pub ticket: u64,
    pub layer: usize,
    pub channel_id: ChannelId,
    pub selection: Selection,
    pub bit_depth: u8,
}

/// First-channel discovery, answered with [`super::ViewerStore::complete_initialization`]
/// or abandoned with [`super::ViewerStore::fail_initialization`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRequest {
    pub generation: u64,
    pub channel_id: ChannelId,
    pub selection: Selection,
    pub bit_depth: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCountRequest {
    pub ticket: u64,
    pub layer: usize,
    pub overlay_id: OverlayId,
    pub resource: ResourceLocator,
}
