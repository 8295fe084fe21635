mod geometry;
mod index;
mod tracker;


pub use geometry::{BoundingBox, DEFAULT_TILE_SIZE, TileMode, bounding_box, is_point_mode};
pub use index::TileIndex;
pub use tracker::{PanelLoading, TileLoadKind, TileLoadTracker};
