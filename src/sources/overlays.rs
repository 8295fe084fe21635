use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::query::ResourceLocator;

use super::Result;

/// One row returned by a tile query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRow {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub marker_bitmask: u32,
    /// Well-known binary polygon, absent for point-mode tiles.
    #[serde(default)]
    pub geometry: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCounts {
    pub row_count: Option<u64>,
    pub markers: BTreeMap<String, u64>,
}

impl MarkerCounts {
    pub fn from_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            row_count: None,
            markers: markers
                .into_iter()
                .map(|(name, count)| (name.into(), count))
                .collect(),
        }
    }
}

/// Runs compiled query text against a resource. Zero rows is a valid result.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, resource: &ResourceLocator, query: &str) -> Result<Vec<GeometryRow>>;
}

#[async_trait]
pub trait MarkerCountService: Send + Sync {
    async fn marker_counts(&self, resource: &ResourceLocator) -> Result<MarkerCounts>;
}
