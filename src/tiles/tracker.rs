use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// In-flight tile identifiers for one loading indicator.
///
/// Counts are derived from set membership, so out-of-order or repeated
/// finish events can never push the count below zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileLoadTracker {
    in_flight: HashSet<String>,
}

impl TileLoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_tile(&mut self, id: impl Into<String>) -> usize {
        let id = id.into();
        trace!(tile = %id, "tile load started");
        self.in_flight.insert(id);
        self.in_flight.len()
    }

    pub fn finish_tile(&mut self, id: &str) -> usize {
        if !self.in_flight.remove(id) {
            trace!(tile = %id, "finish for tile that was not loading");
        }
        self.in_flight.len()
    }

    pub fn count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileLoadKind {
    Channels,
    Overlays,
}

/// The two independent trackers kept for every panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelLoading {
    channels: TileLoadTracker,
    overlays: TileLoadTracker,
}

impl PanelLoading {
    pub fn tracker(&self, kind: TileLoadKind) -> &TileLoadTracker {
        match kind {
            TileLoadKind::Channels => &self.channels,
            TileLoadKind::Overlays => &self.overlays,
        }
    }

    pub fn tracker_mut(&mut self, kind: TileLoadKind) -> &mut TileLoadTracker {
        match kind {
            TileLoadKind::Channels => &mut self.channels,
            TileLoadKind::Overlays => &mut self.overlays,
        }
    }

    pub fn channels_loading(&self) -> usize {
        self.channels.count()
    }

    pub fn overlays_loading(&self) -> usize {
        self.overlays.count()
    }
}
