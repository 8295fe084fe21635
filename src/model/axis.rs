use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisKind {
    X,
    Y,
    Z,
    Channel,
    Time,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PixelType {
    U8,
    #[default]
    U16,
    U32,
    F32,
}

impl PixelType {
    /// Bit depth assumed when bucketing samples into a histogram.
    ///
    /// Float rasters carry no intrinsic range, so they are treated as 16-bit.
    pub fn bit_depth(self) -> u8 {
        match self {
            PixelType::U8 => 8,
            PixelType::U16 | PixelType::F32 => 16,
            PixelType::U32 => 32,
        }
    }
}

pub fn default_axis_for_index(index: usize) -> AxisKind {
    match index {
        0 => AxisKind::Time,
        1 => AxisKind::Channel,
        2 => AxisKind::Z,
        3 => AxisKind::Y,
        4 => AxisKind::X,
        _ => AxisKind::Unknown,
    }
}
