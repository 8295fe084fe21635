use std::fmt;

use serde::{Deserialize, Serialize};

/// Tile address in the pyramid. `z <= 0` for zoomed-out levels; more negative is further out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub z: i32,
    pub x: i64,
    pub y: i64,
}

impl TileIndex {
    pub fn new(z: i32, x: i64, y: i64) -> Self {
        Self { z, x, y }
    }

    /// Opaque identifier used by the load trackers.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}/{}", self.z, self.x, self.y)
    }
}
