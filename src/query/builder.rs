use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::tiles::{BoundingBox, DEFAULT_TILE_SIZE, TileIndex, TileMode, bounding_box};

use super::{BitmaskExpression, ResourceLocator, compile_bitmask, quote_identifier};

pub const ID_COLUMN: &str = "id";
pub const X_COLUMN: &str = "x";
pub const Y_COLUMN: &str = "y";
pub const GEOMETRY_COLUMN: &str = "geometry";
pub const BITMASK_COLUMN: &str = "marker_bitmask";

/// Compiled query for one tile together with the values it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileQuery {
    pub tile: TileIndex,
    pub mode: TileMode,
    pub bbox: BoundingBox,
    #[serde(skip)]
    pub bitmask: BitmaskExpression,
    pub text: String,
}

impl TileQuery {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for TileQuery {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialQueryBuilder {
    tile_size: u32,
}

impl Default for SpatialQueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl SpatialQueryBuilder {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Builds the geometry query for `tile`.
    ///
    /// Rows are selected by their representative point, not by polygon
    /// intersection, so a polygon whose point lies in a neighbouring tile is
    /// served by that tile only. Zero rows means the tile holds no data.
    pub fn build<S: AsRef<str>>(
        &self,
        resource: &ResourceLocator,
        tile: TileIndex,
        markers: &[S],
    ) -> TileQuery {
        let bbox = bounding_box(tile, self.tile_size);
        let mode = TileMode::for_zoom(tile.z);
        let bitmask = compile_bitmask(markers);

        let id = quote_identifier(ID_COLUMN);
        let x = quote_identifier(X_COLUMN);
        let y = quote_identifier(Y_COLUMN);
        let projection = match mode {
            TileMode::Points => format!(
                "{id}, {x}, {y}, {} AS {BITMASK_COLUMN}",
                bitmask.to_sql()
            ),
            TileMode::Polygons => format!(
                "{id}, ST_AsWKB(ST_GeomFromText({})) AS {GEOMETRY_COLUMN}, {x}, {y}, {} AS {BITMASK_COLUMN}",
                quote_identifier(GEOMETRY_COLUMN),
                bitmask.to_sql()
            ),
        };
        let text = format!(
            "SELECT {projection} FROM {} WHERE {x} BETWEEN {} AND {} AND {y} BETWEEN {} AND {}",
            resource.table_function(),
            bbox.min_x,
            bbox.max_x,
            bbox.min_y,
            bbox.max_y,
        );
        debug!(%tile, ?mode, markers = bitmask.columns().len(), "built tile query");

        TileQuery {
            tile,
            mode,
            bbox,
            bitmask,
            text,
        }
    }
}
