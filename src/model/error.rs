use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("image metadata declares no channels")]
    NoChannels,

    #[error("invalid dimension size 0 at axis {axis}")]
    ZeroSizedDimension { axis: usize },

    #[error(
        "channel axis has {axis_size} entries but metadata lists {descriptors} channel descriptors"
    )]
    ChannelCountMismatch { axis_size: usize, descriptors: usize },

    #[error("raster shape mismatch: expected {expected} samples, found {actual}")]
    RasterShapeMismatch { expected: usize, actual: usize },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}
