use crate::model::{ByteDomain, PixelType, Raster};

use super::{HISTOGRAM_BUCKETS, estimate, estimate_raster, histogram};

#[test]
fn contrast_limits_use_fixed_percentiles() {
    let samples = (0..10).collect::<Vec<u32>>();
    let stats = estimate(&samples, 16);
    assert_eq!(stats.contrast_limits, ByteDomain::new(6, 8));
    assert_eq!(stats.domain, ByteDomain::new(0, 9));
}

#[test]
fn domain_spans_extremes() {
    let stats = estimate(&[0, 2, 3, 4, 23_154], 16);
    assert_eq!(stats.domain, ByteDomain::new(0, 23_154));
    assert_eq!(stats.contrast_limits, ByteDomain::new(3, 4));
}

#[test]
fn empty_input_collapses() {
    let stats = estimate(&[], 16);
    assert_eq!(stats.domain, ByteDomain::point(0));
    assert_eq!(stats.contrast_limits, ByteDomain::point(0));
    assert_eq!(stats.histogram.len(), HISTOGRAM_BUCKETS);
    assert!(stats.histogram.iter().all(|count| *count == 0));
}

#[test]
fn identical_values_collapse() {
    let stats = estimate(&[42; 5], 8);
    assert_eq!(stats.domain, ByteDomain::point(42));
    assert_eq!(stats.contrast_limits, ByteDomain::point(42));
    assert_eq!(stats.histogram[42], 5);
}

#[test]
fn single_sample_is_its_own_window() {
    let stats = estimate(&[7], 16);
    assert_eq!(stats.domain, ByteDomain::point(7));
    assert_eq!(stats.contrast_limits, ByteDomain::point(7));
}

#[test]
fn histogram_buckets_by_bit_depth() {
    let counts = histogram(&[0, 255, 256, 511, 65_535], 16);
    assert_eq!(counts[0], 2);
    assert_eq!(counts[1], 2);
    assert_eq!(counts[255], 1);
    assert_eq!(counts.iter().sum::<u64>(), 5);
}

#[test]
fn histogram_clamps_out_of_range_values() {
    let counts = histogram(&[10, 300, 70_000, u32::MAX], 8);
    assert_eq!(counts[10], 1);
    assert_eq!(counts[255], 3);
}

#[test]
fn histogram_merges_parallel_chunks() {
    let samples = vec![1_000_u32; 200_000];
    let counts = histogram(&samples, 16);
    assert_eq!(counts[3], 200_000);
}

#[test]
fn raster_estimate_sorts_first() {
    let raster = Raster::from_samples(5, 2, vec![9, 3, 0, 7, 1, 5, 8, 2, 6, 4], PixelType::U8)
        .expect("raster");
    let stats = estimate_raster(&raster, None);
    assert_eq!(stats.contrast_limits, ByteDomain::new(6, 8));
    assert_eq!(stats.histogram[9], 1);
}
