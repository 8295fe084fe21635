use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{ByteDomain, ImageMetadata, Palette, Rgb, Selection};
use crate::sources::SourceError;
use crate::stats::{ChannelStats, HISTOGRAM_BUCKETS};

use super::{Result, ViewerError};

pub type ChannelId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Uninitialized,
    Loading,
    Initialized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelConfig {
    pub is_initialized: bool,
    pub is_loading: bool,
    pub is_visible: bool,
    pub selection: Selection,
    pub domain: ByteDomain,
    pub contrast_limits_initial: ByteDomain,
    pub contrast_limits: ByteDomain,
    pub histogram: Vec<u64>,
    pub color: Rgb,
    #[serde(skip)]
    pending_ticket: Option<u64>,
}

impl ChannelConfig {
    pub fn new(selection: Selection, color: Rgb) -> Self {
        Self {
            is_initialized: false,
            is_loading: false,
            is_visible: false,
            selection,
            domain: ByteDomain::default(),
            contrast_limits_initial: ByteDomain::default(),
            contrast_limits: ByteDomain::default(),
            histogram: vec![0; HISTOGRAM_BUCKETS],
            color,
            pending_ticket: None,
        }
    }

    pub fn status(&self) -> ChannelStatus {
        if self.is_initialized {
            ChannelStatus::Initialized
        } else if self.is_loading {
            ChannelStatus::Loading
        } else {
            ChannelStatus::Uninitialized
        }
    }

    fn start_loading(&mut self, ticket: u64) {
        self.is_loading = true;
        self.pending_ticket = Some(ticket);
    }

    fn apply_stats(&mut self, stats: &ChannelStats) {
        self.domain = stats.domain;
        self.contrast_limits_initial = stats.contrast_limits;
        self.contrast_limits = stats.contrast_limits;
        self.histogram = stats.histogram.clone();
        self.is_initialized = true;
        self.is_visible = true;
        self.is_loading = false;
        self.pending_ticket = None;
    }

    fn fail_loading(&mut self) {
        self.is_loading = false;
        self.is_visible = false;
        self.pending_ticket = None;
    }
}

/// What a visibility request requires from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Applied,
    /// Statistics must be fetched for `selection`; the channel is now loading.
    FetchStats { selection: Selection },
    /// A fetch for this channel is already in flight.
    Coalesced,
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelsState {
    channels: BTreeMap<ChannelId, ChannelConfig>,
    channel_ids: Vec<ChannelId>,
    selected_channel_id: Option<ChannelId>,
}

impl ChannelsState {
    /// Seeds one uninitialized channel per descriptor, in metadata order.
    ///
    /// Repeated names get a numeric suffix, bumped until the id is unused.
    pub fn discover(metadata: &ImageMetadata, palette: &Palette) -> Self {
        let mut state = Self::default();
        for (index, descriptor) in metadata.channels.iter().enumerate() {
            let base = descriptor
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Channel {index}"));
            let mut id = base.clone();
            let mut suffix = index;
            while state.channels.contains_key(&id) {
                id = format!("{base} ({suffix})");
                suffix += 1;
            }
            let color = descriptor
                .color
                .unwrap_or_else(|| palette.channel_color(index));
            state.insert(id, ChannelConfig::new(Selection::channel(index as u32), color));
        }
        state.selected_channel_id = state.channel_ids.first().cloned();
        state
    }

    pub fn insert(&mut self, id: ChannelId, config: ChannelConfig) {
        match self.channels.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(config);
            }
            Entry::Vacant(entry) => {
                entry.insert(config);
                self.channel_ids.push(id);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ChannelConfig> {
        self.channels.get(id)
    }

    pub fn len(&self) -> usize {
        self.channel_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel_ids.is_empty()
    }

    /// Channel ids in display order.
    pub fn channel_ids(&self) -> &[ChannelId] {
        &self.channel_ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &ChannelConfig)> {
        self.channel_ids
            .iter()
            .filter_map(|id| self.channels.get(id).map(|config| (id, config)))
    }

    pub fn visible(&self) -> impl Iterator<Item = (&ChannelId, &ChannelConfig)> {
        self.iter().filter(|(_, config)| config.is_visible)
    }

    pub fn selected_channel_id(&self) -> Option<&str> {
        self.selected_channel_id.as_deref()
    }

    pub fn selected(&self) -> Option<&ChannelConfig> {
        self.selected_channel_id
            .as_deref()
            .and_then(|id| self.channels.get(id))
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        self.config(id)?;
        self.selected_channel_id = Some(id.to_string());
        Ok(())
    }

    pub fn first_channel(&self) -> Option<(&ChannelId, &ChannelConfig)> {
        self.iter().next()
    }

    /// Starts the lazy initialization state machine for `id`.
    ///
    /// Only an uninitialized, idle channel asked to become visible needs a
    /// fetch; `ticket` then identifies that fetch until it resolves.
    pub fn request_visibility(
        &mut self,
        id: &str,
        visible: bool,
        ticket: u64,
    ) -> Result<VisibilityChange> {
        let config = self.config_mut(id)?;
        if config.is_initialized {
            config.is_visible = visible;
            return Ok(VisibilityChange::Applied);
        }
        if !visible {
            return Ok(VisibilityChange::Ignored);
        }
        if config.is_loading {
            debug!(channel = id, "statistics fetch already in flight");
            return Ok(VisibilityChange::Coalesced);
        }
        config.start_loading(ticket);
        debug!(channel = id, ticket, "channel loading");
        Ok(VisibilityChange::FetchStats {
            selection: config.selection,
        })
    }

    /// Applies the outcome of fetch `ticket`; returns whether a channel was waiting for it.
    pub fn complete_stats(
        &mut self,
        ticket: u64,
        outcome: std::result::Result<&ChannelStats, &SourceError>,
    ) -> bool {
        let Some((id, config)) = self
            .channels
            .iter_mut()
            .find(|(_, config)| config.pending_ticket == Some(ticket))
        else {
            return false;
        };
        match outcome {
            Ok(stats) => {
                config.apply_stats(stats);
                debug!(channel = %id, "channel initialized");
            }
            Err(error) => {
                config.fail_loading();
                warn!(channel = %id, %error, "channel statistics failed, hiding channel");
            }
        }
        true
    }

    /// Marks a channel initialized and visible with already computed statistics.
    pub fn initialize_with(&mut self, id: &str, stats: &ChannelStats) -> Result<()> {
        self.config_mut(id)?.apply_stats(stats);
        Ok(())
    }

    pub fn set_color(&mut self, id: &str, color: Rgb) -> Result<()> {
        self.config_mut(id)?.color = color;
        Ok(())
    }

    /// Sets the selected channel's limits, ordered and clamped to its domain.
    pub fn set_contrast_limits(&mut self, limits: ByteDomain) {
        let Some(config) = self.selected_mut() else {
            debug!("no channel selected, contrast limits unchanged");
            return;
        };
        config.contrast_limits = limits.clamp_to(&config.domain);
    }

    pub fn reset_contrast_limits(&mut self) {
        if let Some(config) = self.selected_mut() {
            config.contrast_limits = config.contrast_limits_initial;
        }
    }

    /// Moves `id` to position `to` in display order, clamping `to` to the end.
    pub fn move_channel(&mut self, id: &str, to: usize) -> Result<()> {
        let from = self
            .channel_ids
            .iter()
            .position(|candidate| candidate == id)
            .ok_or_else(|| ViewerError::UnknownChannel(id.to_string()))?;
        let moved = self.channel_ids.remove(from);
        let to = to.min(self.channel_ids.len());
        self.channel_ids.insert(to, moved);
        Ok(())
    }

    fn selected_mut(&mut self) -> Option<&mut ChannelConfig> {
        let id = self.selected_channel_id.as_deref()?;
        self.channels.get_mut(id)
    }

    fn config(&self, id: &str) -> Result<&ChannelConfig> {
        self.channels
            .get(id)
            .ok_or_else(|| ViewerError::UnknownChannel(id.to_string()))
    }

    fn config_mut(&mut self, id: &str) -> Result<&mut ChannelConfig> {
        self.channels
            .get_mut(id)
            .ok_or_else(|| ViewerError::UnknownChannel(id.to_string()))
    }
}
