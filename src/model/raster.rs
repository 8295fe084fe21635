use ndarray::Array2;
use rayon::prelude::*;

use super::{CoreError, PixelType, Result};

/// One decoded plane of a channel, row-major `[Y, X]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub data: Array2<u32>,
    pub pixel_type: PixelType,
}

impl Raster {
    pub fn new(data: Array2<u32>, pixel_type: PixelType) -> Self {
        Self { data, pixel_type }
    }

    pub fn from_samples(
        width: usize,
        height: usize,
        samples: Vec<u32>,
        pixel_type: PixelType,
    ) -> Result<Self> {
        let expected = width * height;
        let actual = samples.len();
        let data = Array2::from_shape_vec((height, width), samples)
            .map_err(|_| CoreError::RasterShapeMismatch { expected, actual })?;
        Ok(Self { data, pixel_type })
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All samples in ascending order.
    pub fn sorted_samples(&self) -> Vec<u32> {
        let mut samples = self.data.iter().copied().collect::<Vec<_>>();
        samples.par_sort_unstable();
        samples
    }
}
