use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{ByteDomain, Raster};

pub const HISTOGRAM_BUCKETS: usize = 256;

// Percentiles as exact fractions: index = (n - 1) * numerator / denominator.
const LOWER_PERCENTILE: (u64, u64) = (70, 100);
const UPPER_PERCENTILE: (u64, u64) = (9_999, 10_000);

const HISTOGRAM_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub domain: ByteDomain,
    pub contrast_limits: ByteDomain,
    pub histogram: Vec<u64>,
}

impl ChannelStats {
    pub fn empty() -> Self {
        Self {
            domain: ByteDomain::point(0),
            contrast_limits: ByteDomain::point(0),
            histogram: vec![0; HISTOGRAM_BUCKETS],
        }
    }
}

/// Derives display defaults from samples sorted in ascending order.
///
/// The contrast window runs from the 70th to the 99.99th percentile sample.
/// Empty input yields a collapsed `[0, 0]` domain and an all-zero histogram.
pub fn estimate(sorted: &[u32], bit_depth: u8) -> ChannelStats {
    debug_assert!(
        sorted.windows(2).all(|pair| pair[0] <= pair[1]),
        "samples must be sorted"
    );
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return ChannelStats::empty();
    };
    let lower = sorted[percentile_index(sorted.len(), LOWER_PERCENTILE)];
    let upper = sorted[percentile_index(sorted.len(), UPPER_PERCENTILE)];

    ChannelStats {
        domain: ByteDomain::new(first, last),
        contrast_limits: ByteDomain::new(lower, upper),
        histogram: histogram(sorted, bit_depth),
    }
}

/// Sorts the raster and estimates with its pixel type's bit depth unless overridden.
pub fn estimate_raster(raster: &Raster, bit_depth: Option<u8>) -> ChannelStats {
    let bit_depth = bit_depth.unwrap_or_else(|| raster.pixel_type.bit_depth());
    estimate(&raster.sorted_samples(), bit_depth)
}

/// Counts samples into 256 equal buckets spanning `[0, 2^bit_depth)`.
///
/// Values beyond the assumed range land in the last bucket.
pub fn histogram(samples: &[u32], bit_depth: u8) -> Vec<u64> {
    let width = bucket_width(bit_depth);
    samples
        .par_chunks(HISTOGRAM_CHUNK)
        .fold(
            || vec![0_u64; HISTOGRAM_BUCKETS],
            |mut counts, chunk| {
                for value in chunk {
                    counts[bucket_index(*value, width)] += 1;
                }
                counts
            },
        )
        .reduce(
            || vec![0_u64; HISTOGRAM_BUCKETS],
            |mut left, right| {
                left.iter_mut()
                    .zip(right)
                    .for_each(|(total, count)| *total += count);
                left
            },
        )
}

fn percentile_index(len: usize, (numerator, denominator): (u64, u64)) -> usize {
    let last = len.saturating_sub(1) as u64;
    (last * numerator / denominator) as usize
}

fn bucket_width(bit_depth: u8) -> u64 {
    let depth = u32::from(bit_depth.clamp(8, 32));
    (1_u64 << depth) / HISTOGRAM_BUCKETS as u64
}

fn bucket_index(value: u32, width: u64) -> usize {
    ((u64::from(value) / width) as usize).min(HISTOGRAM_BUCKETS - 1)
}
