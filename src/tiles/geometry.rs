use serde::{Deserialize, Serialize};

use super::TileIndex;

pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Levels strictly below this one fetch points instead of polygons.
const POINT_MODE_BELOW: i32 = -2;

// 2^900 times any u32 tile size and i64 tile coordinate is still finite in f64.
const MAX_ZOOM_EXPONENT: i32 = 900;

/// Axis-aligned box in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileMode {
    Points,
    Polygons,
}

impl TileMode {
    pub fn for_zoom(z: i32) -> Self {
        if is_point_mode(z) {
            TileMode::Points
        } else {
            TileMode::Polygons
        }
    }
}

/// Image-space extent covered by `tile`.
///
/// A tile at level `z` spans `tile_size * 2^(1 - z)` pixels on each side.
/// The exponent is clamped to `±MAX_ZOOM_EXPONENT` so every bound stays finite.
pub fn bounding_box(tile: TileIndex, tile_size: u32) -> BoundingBox {
    let zoom = 1_i32
        .saturating_sub(tile.z)
        .clamp(-MAX_ZOOM_EXPONENT, MAX_ZOOM_EXPONENT);
    let scale = f64::from(tile_size) * 2_f64.powi(zoom);
    let min_x = tile.x as f64 * scale;
    let min_y = tile.y as f64 * scale;
    BoundingBox {
        min_x,
        min_y,
        max_x: min_x + scale,
        max_y: min_y + scale,
    }
}

/// Below level -2 polygon outlines are sub-pixel, so tiles fetch representative points only.
pub fn is_point_mode(z: i32) -> bool {
    z < POINT_MODE_BELOW
}
