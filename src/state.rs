mod channels;
mod command;
mod error;
mod layer;
mod overlays;
mod requests;
mod store;

#[cfg(test)]
mod tests;

pub use channels::{ChannelConfig, ChannelId, ChannelStatus, ChannelsState, VisibilityChange};
pub use command::{Effect, ViewerCommand};
pub use error::{Result, ViewerError};
pub use layer::LayerState;
pub use overlays::{MarkerConfig, MarkerId, OverlayDataset, OverlayId, OverlayStatus, OverlaysState};
pub use requests::{InitRequest, MarkerCountRequest, StatsRequest};
pub use store::{LoadingSnapshot, ViewerSnapshot, ViewerStore};
