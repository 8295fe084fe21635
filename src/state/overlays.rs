use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Palette, Rgba};
use crate::query::{MAX_MARKERS, ResourceLocator};
use crate::sources::{MarkerCounts, SourceError};

use super::{Result, ViewerError};

pub type OverlayId = String;
pub type MarkerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerConfig {
    pub color: Rgba,
    pub count: u64,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum OverlayStatus {
    Counting,
    Ready,
    Failed(String),
}

/// One cell-detection dataset attached to a layer state.
///
/// Markers are keyed by column name; that ascending order is the canonical
/// bit order used when compiling tile queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayDataset {
    pub resource: ResourceLocator,
    pub status: OverlayStatus,
    pub row_count: Option<u64>,
    pub markers: BTreeMap<MarkerId, MarkerConfig>,
    #[serde(skip)]
    pending_ticket: Option<u64>,
}

impl OverlayDataset {
    fn counting(resource: ResourceLocator, ticket: u64) -> Self {
        Self {
            resource,
            status: OverlayStatus::Counting,
            row_count: None,
            markers: BTreeMap::new(),
            pending_ticket: Some(ticket),
        }
    }

    pub fn marker_order(&self) -> Vec<MarkerId> {
        self.markers.keys().cloned().collect()
    }

    /// Bits of visible markers, positioned as in [`Self::marker_order`].
    pub fn visible_mask(&self) -> u32 {
        self.markers
            .values()
            .take(MAX_MARKERS)
            .enumerate()
            .filter(|(_, marker)| marker.is_visible)
            .fold(0_u32, |mask, (bit, _)| mask | (1_u32 << bit))
    }

    fn marker_mut(&mut self, overlay: &str, marker: &str) -> Result<&mut MarkerConfig> {
        self.markers
            .get_mut(marker)
            .ok_or_else(|| ViewerError::UnknownMarker {
                overlay: overlay.to_string(),
                marker: marker.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlaysState {
    overlays: BTreeMap<OverlayId, OverlayDataset>,
}

impl OverlaysState {
    pub fn get(&self, id: &str) -> Option<&OverlayDataset> {
        self.overlays.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &OverlayId> {
        self.overlays.keys()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Registers `id` and reports whether its marker counts must be fetched under `ticket`.
    ///
    /// Overlays already counting or counted are left alone; failed ones are retried.
    pub fn add_overlay(&mut self, id: &str, resource: ResourceLocator, ticket: u64) -> bool {
        match self.overlays.get_mut(id) {
            Some(existing) => match existing.status {
                OverlayStatus::Counting | OverlayStatus::Ready => false,
                OverlayStatus::Failed(_) => {
                    *existing = OverlayDataset::counting(resource, ticket);
                    true
                }
            },
            None => {
                self.overlays
                    .insert(id.to_string(), OverlayDataset::counting(resource, ticket));
                true
            }
        }
    }

    /// Applies the outcome of count `ticket`; returns whether an overlay was waiting for it.
    pub fn complete_marker_counts(
        &mut self,
        ticket: u64,
        outcome: std::result::Result<&MarkerCounts, &SourceError>,
        palette: &Palette,
    ) -> bool {
        let Some((id, overlay)) = self
            .overlays
            .iter_mut()
            .find(|(_, overlay)| overlay.pending_ticket == Some(ticket))
        else {
            return false;
        };
        overlay.pending_ticket = None;
        match outcome {
            Ok(counts) => {
                for (index, (name, count)) in counts.markers.iter().enumerate() {
                    overlay
                        .markers
                        .entry(name.clone())
                        .and_modify(|marker| marker.count = *count)
                        .or_insert(MarkerConfig {
                            color: palette.marker_color(index),
                            count: *count,
                            is_visible: false,
                        });
                }
                if overlay.markers.len() > MAX_MARKERS {
                    warn!(
                        overlay = %id,
                        markers = overlay.markers.len(),
                        "overlay has more markers than fit in a tile bitmask"
                    );
                }
                overlay.row_count = counts.row_count;
                overlay.status = OverlayStatus::Ready;
                debug!(overlay = %id, markers = overlay.markers.len(), "overlay ready");
            }
            Err(error) => {
                warn!(overlay = %id, %error, "marker counts failed");
                overlay.status = OverlayStatus::Failed(error.to_string());
            }
        }
        true
    }

    pub fn remove_overlay(&mut self, id: &str) -> Result<OverlayDataset> {
        self.overlays
            .remove(id)
            .ok_or_else(|| ViewerError::UnknownOverlay(id.to_string()))
    }

    pub fn set_marker_visibility(
        &mut self,
        overlay: &str,
        marker: &str,
        visible: bool,
    ) -> Result<()> {
        self.overlay_mut(overlay)?.marker_mut(overlay, marker)?.is_visible = visible;
        Ok(())
    }

    pub fn set_marker_color(&mut self, overlay: &str, marker: &str, color: Rgba) -> Result<()> {
        self.overlay_mut(overlay)?.marker_mut(overlay, marker)?.color = color;
        Ok(())
    }

    pub fn set_all_markers_visibility(&mut self, overlay: &str, visible: bool) -> Result<()> {
        self.overlay_mut(overlay)?
            .markers
            .values_mut()
            .for_each(|marker| marker.is_visible = visible);
        Ok(())
    }

    pub fn marker_order(&self, overlay: &str) -> Result<Vec<MarkerId>> {
        Ok(self.overlay(overlay)?.marker_order())
    }

    pub fn visible_mask(&self, overlay: &str) -> Result<u32> {
        Ok(self.overlay(overlay)?.visible_mask())
    }

    fn overlay(&self, id: &str) -> Result<&OverlayDataset> {
        self.overlays
            .get(id)
            .ok_or_else(|| ViewerError::UnknownOverlay(id.to_string()))
    }

    fn overlay_mut(&mut self, id: &str) -> Result<&mut OverlayDataset> {
        self.overlays
            .get_mut(id)
            .ok_or_else(|| ViewerError::UnknownOverlay(id.to_string()))
    }
}
