use thiserror::Error;

use crate::model::CoreError;
use crate::query::QueryError;
use crate::sources::SourceError;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error("channel discovery timed out after {timeout_ms} ms")]
    InitializationTimeout { timeout_ms: u64 },

    #[error("statistics for channel `{channel}` could not be computed: {source}")]
    StatsFetch {
        channel: String,
        #[source]
        source: SourceError,
    },

    #[error("marker counts for overlay `{overlay}` could not be fetched: {source}")]
    MarkerCountFetch {
        overlay: String,
        #[source]
        source: SourceError,
    },

    #[error("tile {tile} could not be loaded: {source}")]
    TileFetch {
        tile: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    InvalidResourceLocator(#[from] QueryError),

    #[error("image metadata is invalid: {0}")]
    InvalidMetadata(#[from] CoreError),

    #[error("image metadata has not been provided")]
    MissingMetadata,

    #[error("no pixel source has been attached")]
    MissingPixelSource,

    #[error("no {0} has been attached")]
    MissingService(&'static str),

    #[error("viewer has not been initialized")]
    NotInitialized,

    #[error("viewer is already initialized")]
    AlreadyInitialized,

    #[error("viewer initialization is already in progress")]
    InitializationInProgress,

    #[error("no image panel is active")]
    NoActivePanel,

    #[error("image panel {0} does not exist")]
    UnknownPanel(usize),

    #[error("layer state {0} does not exist")]
    UnknownLayerState(usize),

    #[error("the last layer state cannot be removed")]
    LastLayerState,

    #[error("channel `{0}` does not exist")]
    UnknownChannel(String),

    #[error("overlay `{0}` does not exist")]
    UnknownOverlay(String),

    #[error("marker `{marker}` does not exist in overlay `{overlay}`")]
    UnknownMarker { overlay: String, marker: String },
}

impl ViewerError {
    /// Errors that invalidate the whole viewer rather than one channel or overlay.
    pub fn is_viewer_wide(&self) -> bool {
        matches!(
            self,
            ViewerError::InitializationTimeout { .. }
                | ViewerError::InvalidResourceLocator(_)
                | ViewerError::InvalidMetadata(_)
                | ViewerError::MissingMetadata
                | ViewerError::MissingPixelSource
        )
    }
}
