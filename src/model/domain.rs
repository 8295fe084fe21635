use serde::{Deserialize, Serialize};

/// Upper bound of the placeholder domain used before a channel's statistics are known.
pub const DEFAULT_DOMAIN_MAX: u32 = 1 << 16;

/// Closed `[min, max]` intensity range with `min <= max`.
///
/// Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ByteDomain {
    min: u32,
    max: u32,
}

impl ByteDomain {
    /// Builds a domain from two bounds given in either order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn point(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn span(&self) -> u32 {
        self.max - self.min
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp_value(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }

    /// Restricts both bounds to `outer`; the result always lies inside `outer`.
    pub fn clamp_to(&self, outer: &ByteDomain) -> ByteDomain {
        ByteDomain::new(outer.clamp_value(self.min), outer.clamp_value(self.max))
    }
}

impl Default for ByteDomain {
    fn default() -> Self {
        Self::new(0, DEFAULT_DOMAIN_MAX)
    }
}

impl From<[u32; 2]> for ByteDomain {
    fn from(value: [u32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<ByteDomain> for [u32; 2] {
    fn from(value: ByteDomain) -> Self {
        [value.min, value.max]
    }
}
