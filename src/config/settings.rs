use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{Palette, PixelType, Rgb};
use crate::tiles::DEFAULT_TILE_SIZE;

use super::{ConfigError, Result};

pub const DEFAULT_INITIALIZATION_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub tile_size: u32,
    pub initialization_timeout_ms: u64,
    /// Overrides the bit depth derived from the image pixel type.
    pub histogram_bit_depth: Option<u8>,
    pub palette: Option<Vec<Rgb>>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            initialization_timeout_ms: DEFAULT_INITIALIZATION_TIMEOUT_MS,
            histogram_bit_depth: None,
            palette: None,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tile_size.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "`tile_size` must be a non-zero power of two, found {}",
                self.tile_size
            )));
        }
        if self.initialization_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "`initialization_timeout_ms` must be greater than zero".to_string(),
            ));
        }
        if let Some(depth) = self.histogram_bit_depth {
            if !(1..=32).contains(&depth) {
                return Err(ConfigError::Invalid(format!(
                    "`histogram_bit_depth` must be within 1..=32, found {depth}"
                )));
            }
        }
        if self.palette.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Invalid(
                "`palette` must list at least one color".to_string(),
            ));
        }
        Ok(())
    }

    pub fn initialization_timeout(&self) -> Duration {
        Duration::from_millis(self.initialization_timeout_ms)
    }

    pub fn bit_depth_for(&self, pixel_type: PixelType) -> u8 {
        self.histogram_bit_depth
            .unwrap_or_else(|| pixel_type.bit_depth())
    }

    pub fn palette(&self) -> Palette {
        match &self.palette {
            Some(colors) => Palette::default().with_channel_colors(colors.clone()),
            None => Palette::default(),
        }
    }
}
