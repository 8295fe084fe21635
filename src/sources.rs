mod error;
mod overlays;
mod pixels;

pub use error::{Result, SourceError};
pub use overlays::{GeometryRow, MarkerCountService, MarkerCounts, QueryExecutor};
pub use pixels::{MetadataProvider, PixelSource};
