use tracing::debug;

use crate::model::Selection;
use crate::sources::{PixelSource, Result};
use crate::stats::{ChannelStats, estimate_raster};

/// Fetches the lowest-resolution raster for `selection` and estimates its statistics.
pub async fn fetch_channel_stats(
    source: &dyn PixelSource,
    selection: Selection,
    bit_depth: u8,
) -> Result<ChannelStats> {
    let raster = source.get_raster(&selection).await?;
    let stats = estimate_raster(&raster, Some(bit_depth));
    debug!(
        channel = selection.c,
        samples = raster.len(),
        domain = ?stats.domain,
        limits = ?stats.contrast_limits,
        "channel statistics estimated"
    );
    Ok(stats)
}
