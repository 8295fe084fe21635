mod estimator;

#[cfg(test)]
mod tests;

pub use estimator::{ChannelStats, HISTOGRAM_BUCKETS, estimate, estimate_raster, histogram};
