use super::{ResourceLocator, quote_identifier};

/// Alias of the total row count column in [`marker_count_query`].
pub const ROW_COUNT_COLUMN: &str = "__row_count";

/// Row count plus the number of true values of each marker column.
pub fn marker_count_query<S: AsRef<str>>(resource: &ResourceLocator, markers: &[S]) -> String {
    let mut projection = vec![format!("COUNT(*) AS {}", quote_identifier(ROW_COUNT_COLUMN))];
    projection.extend(markers.iter().map(|marker| {
        let column = quote_identifier(marker.as_ref());
        format!("SUM(CAST(COALESCE({column}, FALSE) AS UBIGINT)) AS {column}")
    }));
    format!(
        "SELECT {} FROM {}",
        projection.join(", "),
        resource.table_function()
    )
}

/// Lists the boolean columns of a resource, which are its marker columns.
pub fn boolean_columns_query(resource: &ResourceLocator) -> String {
    format!(
        "SELECT column_name FROM (DESCRIBE SELECT * FROM {}) WHERE column_type = 'BOOLEAN' ORDER BY column_name",
        resource.table_function()
    )
}
