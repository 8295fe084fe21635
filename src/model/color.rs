use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba {
        let [r, g, b] = self.0;
        Rgba([r, g, b, alpha])
    }
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
}

const CHANNEL_COLORS: [Rgb; 8] = [
    Rgb::new(0, 0, 255),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 0, 255),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 128, 0),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
    Rgb::new(255, 0, 0),
];

const MARKER_COLORS: [Rgba; 10] = [
    Rgba::new(230, 25, 75, 255),
    Rgba::new(60, 180, 75, 255),
    Rgba::new(255, 225, 25, 255),
    Rgba::new(67, 99, 216, 255),
    Rgba::new(245, 130, 49, 255),
    Rgba::new(145, 30, 180, 255),
    Rgba::new(70, 240, 240, 255),
    Rgba::new(240, 50, 230, 255),
    Rgba::new(188, 246, 12, 255),
    Rgba::new(250, 190, 190, 255),
];

/// Stateless color lookup used when metadata does not provide a color.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    channels: Vec<Rgb>,
    markers: Vec<Rgba>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            channels: CHANNEL_COLORS.to_vec(),
            markers: MARKER_COLORS.to_vec(),
        }
    }
}

impl Palette {
    /// Replaces the channel colors; an empty list keeps the built-in ones.
    pub fn with_channel_colors(mut self, colors: Vec<Rgb>) -> Self {
        if !colors.is_empty() {
            self.channels = colors;
        }
        self
    }

    pub fn channel_color(&self, index: usize) -> Rgb {
        self.channels[index % self.channels.len()]
    }

    pub fn marker_color(&self, index: usize) -> Rgba {
        self.markers[index % self.markers.len()]
    }
}
