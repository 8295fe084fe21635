use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("raster fetch failed: {0}")]
    Raster(String),

    #[error("metadata unavailable: {0}")]
    Metadata(String),

    #[error("query execution failed: {0}")]
    Query(String),

    #[error("marker count failed: {0}")]
    MarkerCount(String),

    #[error("no {0} configured")]
    Unavailable(&'static str),
}
