mod aggregate;
mod bitmask;
mod builder;
mod error;
mod locator;


pub use aggregate::{ROW_COUNT_COLUMN, boolean_columns_query, marker_count_query};
pub use bitmask::{BitmaskExpression, MAX_MARKERS, compile_bitmask};
pub use builder::{
    BITMASK_COLUMN, GEOMETRY_COLUMN, ID_COLUMN, SpatialQueryBuilder, TileQuery, X_COLUMN,
    Y_COLUMN,
};
pub use error::{QueryError, Result};
pub use locator::ResourceLocator;

/// Double-quotes an identifier so hyphens and other punctuation survive.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
