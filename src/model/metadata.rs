use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AxisKind, CoreError, PixelType, Result, Rgb, default_axis_for_index};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dim {
    pub axis: AxisKind,
    pub size: usize,
    pub spacing: Option<f32>,
    pub unit: Option<String>,
}

impl Dim {
    pub fn new(axis: AxisKind, size: usize) -> Self {
        Self {
            axis,
            size,
            spacing: None,
            unit: None,
        }
    }

    pub fn with_spacing(mut self, spacing: f32, unit: impl Into<String>) -> Self {
        self.spacing = Some(spacing);
        self.unit = Some(unit.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub name: Option<String>,
    pub color: Option<Rgb>,
}

impl ChannelDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: None,
        }
    }
}

/// Raster coordinate of one plane: position along each non-spatial axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub c: u32,
    pub t: u32,
}

impl Selection {
    pub fn channel(c: u32) -> Self {
        Self {
            c,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub dims: Vec<Dim>,
    pub pixel_type: PixelType,
    pub channels: Vec<ChannelDescriptor>,
    #[serde(default)]
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl Default for ImageMetadata {
    fn default() -> Self {
        Self {
            dims: Vec::new(),
            pixel_type: PixelType::U16,
            channels: Vec::new(),
            extras: BTreeMap::new(),
        }
    }
}

impl ImageMetadata {
    pub fn from_shape(shape: &[usize], pixel_type: PixelType) -> Self {
        let dims = shape
            .iter()
            .enumerate()
            .map(|(index, size)| Dim::new(default_axis_for_index(index), *size))
            .collect();
        Self {
            dims,
            pixel_type,
            ..Self::default()
        }
    }

    pub fn with_channel_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = names.into_iter().map(ChannelDescriptor::named).collect();
        self
    }

    pub fn axis_index(&self, axis: AxisKind) -> Option<usize> {
        self.dims.iter().position(|d| d.axis == axis)
    }

    pub fn size_of(&self, axis: AxisKind) -> Option<usize> {
        self.axis_index(axis).map(|index| self.dims[index].size)
    }

    /// Physical pixel size along `axis`, if the source recorded one.
    pub fn physical_size(&self, axis: AxisKind) -> Option<(f32, &str)> {
        let dim = &self.dims[self.axis_index(axis)?];
        Some((dim.spacing?, dim.unit.as_deref().unwrap_or("")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(CoreError::NoChannels);
        }
        for (axis, dim) in self.dims.iter().enumerate() {
            if dim.size == 0 {
                return Err(CoreError::ZeroSizedDimension { axis });
            }
        }
        match self.size_of(AxisKind::Channel) {
            Some(axis_size) if axis_size != self.channels.len() => {
                Err(CoreError::ChannelCountMismatch {
                    axis_size,
                    descriptors: self.channels.len(),
                })
            }
            _ => Ok(()),
        }
    }
}
