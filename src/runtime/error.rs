use thiserror::Error;

use crate::config::ConfigError;
use crate::model::CoreError;
use crate::query::QueryError;
use crate::sources::SourceError;
use crate::state::ViewerError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("image model error: {0}")]
    Core(#[from] CoreError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    #[error("viewer error: {0}")]
    Viewer(#[from] ViewerError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
