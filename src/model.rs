mod axis;
mod color;
mod domain;
mod error;
mod metadata;
mod raster;


pub use axis::{AxisKind, PixelType, default_axis_for_index};
pub use color::{Palette, Rgb, Rgba};
pub use domain::{ByteDomain, DEFAULT_DOMAIN_MAX};
pub use error::{CoreError, Result};
pub use metadata::{ChannelDescriptor, Dim, ImageMetadata, Selection};
pub use raster::Raster;
