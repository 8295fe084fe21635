use std::fmt;

use tracing::warn;

use super::quote_identifier;

/// Width of the packed marker integer.
pub const MAX_MARKERS: usize = 32;

/// Bit-OR of boolean marker columns, bit `i` holding the `i`-th column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitmaskExpression {
    columns: Vec<String>,
}

impl BitmaskExpression {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_constant(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn bit_for(&self, marker: &str) -> Option<u32> {
        self.columns
            .iter()
            .position(|column| column == marker)
            .map(|index| index as u32)
    }

    /// Computes the mask a query engine would produce for one row.
    pub fn evaluate<F>(&self, is_set: F) -> u32
    where
        F: Fn(&str) -> bool,
    {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| is_set(column))
            .fold(0_u32, |mask, (bit, _)| mask | (1_u32 << bit))
    }

    pub fn to_sql(&self) -> String {
        if self.columns.is_empty() {
            return "0".to_string();
        }
        let terms = self
            .columns
            .iter()
            .enumerate()
            .map(|(bit, column)| {
                format!(
                    "(CAST(COALESCE({}, FALSE) AS UINTEGER) << {bit})",
                    quote_identifier(column)
                )
            })
            .collect::<Vec<_>>();
        format!("({})", terms.join(" | "))
    }
}

impl fmt::Display for BitmaskExpression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.to_sql())
    }
}

/// Packs `markers` into one integer expression in caller order.
///
/// Only the first [`MAX_MARKERS`] entries are encoded. Bit positions follow the
/// input order, so callers must pass the same canonical ordering for every tile.
pub fn compile_bitmask<S: AsRef<str>>(markers: &[S]) -> BitmaskExpression {
    if markers.len() > MAX_MARKERS {
        warn!(
            supplied = markers.len(),
            kept = MAX_MARKERS,
            "marker capacity exceeded, dropping trailing markers"
        );
    }
    BitmaskExpression {
        columns: markers
            .iter()
            .take(MAX_MARKERS)
            .map(|marker| marker.as_ref().to_string())
            .collect(),
    }
}
