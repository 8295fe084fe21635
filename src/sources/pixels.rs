use async_trait::async_trait;

use crate::model::{ImageMetadata, Raster, Selection};

use super::Result;

#[async_trait]
pub trait PixelSource: Send + Sync {
    async fn get_raster(&self, selection: &Selection) -> Result<Raster>;
}

pub trait MetadataProvider: Send + Sync {
    fn image_metadata(&self) -> Result<ImageMetadata>;
}

impl MetadataProvider for ImageMetadata {
    fn image_metadata(&self) -> Result<ImageMetadata> {
        Ok(self.clone())
    }
}
