use std::cell::{Ref, RefCell};
use std::future::Future;

use tokio::time;
use tracing::{debug, info, warn};

use crate::query::{SpatialQueryBuilder, TileQuery};
use crate::sources::{GeometryRow, SourceError};
use crate::state::{
    Effect, InitRequest, MarkerCountRequest, StatsRequest, ViewerCommand, ViewerError,
    ViewerSnapshot, ViewerStore,
};
use crate::tiles::{TileIndex, TileLoadKind};

use super::{AppError, Result, ViewerContext, fetch_channel_stats};

/// Drives a [`ViewerStore`] against the collaborators in a [`ViewerContext`].
///
/// The store lives in a `RefCell` and is never borrowed across an await
/// point, so overlapping calls on one task interleave safely.
pub struct ViewerSession {
    context: ViewerContext,
    store: RefCell<ViewerStore>,
    builder: SpatialQueryBuilder,
}

impl ViewerSession {
    /// Builds a session, reading image metadata from the context's provider if it has one.
    pub fn new(context: ViewerContext) -> Result<Self> {
        context.config().validate()?;
        let mut store = ViewerStore::new(context.config());
        if let Some(provider) = context.metadata_provider() {
            let metadata = provider.image_metadata()?;
            store.set_metadata(metadata)?;
        }
        Ok(Self {
            builder: SpatialQueryBuilder::new(context.config().tile_size),
            store: RefCell::new(store),
            context,
        })
    }

    pub fn context(&self) -> &ViewerContext {
        &self.context
    }

    pub fn store(&self) -> Ref<'_, ViewerStore> {
        self.store.borrow()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.store.borrow().snapshot()
    }

    /// Applies `command` and runs whatever fetch it asks for.
    pub async fn execute(&self, command: ViewerCommand) -> Result<Effect> {
        let effect = self.store.borrow_mut().dispatch(command)?;
        match &effect {
            Effect::Initialize(request) => {
                self.initialize(request.clone()).await?;
            }
            Effect::FetchChannelStats(request) => self.fetch_stats(request.clone()).await?,
            Effect::FetchMarkerCounts(request) => self.fetch_marker_counts(request.clone()).await?,
            Effect::None
            | Effect::PanelAdded(_)
            | Effect::LayerStateAdded(_)
            | Effect::TilesInFlight(_) => {}
        }
        Ok(effect)
    }

    /// Duplicates the active layer state, or runs first-time initialization.
    pub async fn add_channels_state(&self) -> Result<usize> {
        let initialized = self.store.borrow().is_initialized();
        if initialized {
            return Ok(self.store.borrow_mut().add_channels_state()?);
        }
        let request = self.store.borrow_mut().begin_initialization()?;
        self.initialize(request).await
    }

    /// Shows or hides a channel, fetching its statistics on first show.
    ///
    /// A failed fetch leaves the channel hidden and is returned as an error.
    pub async fn set_channel_visibility(&self, channel_id: &str, visible: bool) -> Result<()> {
        let request = self
            .store
            .borrow_mut()
            .set_channel_visibility(channel_id, visible)?;
        if let Some(request) = request {
            self.fetch_stats(request).await?;
        }
        Ok(())
    }

    /// Attaches an overlay and fetches its marker counts.
    pub async fn add_overlay(&self, overlay_id: &str, resource: &str) -> Result<()> {
        let request = self.store.borrow_mut().add_overlay(overlay_id, resource)?;
        if let Some(request) = request {
            self.fetch_marker_counts(request).await?;
        }
        Ok(())
    }

    pub fn tile_query(&self, overlay_id: &str, tile: TileIndex) -> Result<TileQuery> {
        Ok(self
            .store
            .borrow()
            .overlay_tile_query(overlay_id, tile, &self.builder)?)
    }

    /// Runs `load` while `tile_id` is counted as in flight for `panel`.
    ///
    /// The tile is released even if the returned future is dropped early.
    pub async fn track_tile<F, T>(
        &self,
        panel: usize,
        kind: TileLoadKind,
        tile_id: &str,
        load: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.store.borrow_mut().load_tile(panel, kind, tile_id)?;
        let _guard = TileLoadGuard {
            store: &self.store,
            panel,
            kind,
            tile_id,
        };
        load.await
    }

    /// Loads one overlay tile of the active layer state for `panel`.
    ///
    /// An empty tile is a valid result. Loads are tracked per overlay, so the
    /// same tile of two overlays counts twice.
    pub async fn load_overlay_tile(
        &self,
        panel: usize,
        overlay_id: &str,
        tile: TileIndex,
    ) -> Result<Vec<GeometryRow>> {
        let executor = self
            .context
            .query_executor()
            .ok_or(ViewerError::MissingService("query executor"))?;
        let (resource, query) = {
            let store = self.store.borrow();
            let overlay = store
                .active_layer()?
                .overlays
                .get(overlay_id)
                .ok_or_else(|| ViewerError::UnknownOverlay(overlay_id.to_string()))?;
            let query = store.overlay_tile_query(overlay_id, tile, &self.builder)?;
            (overlay.resource.clone(), query)
        };
        let key = tile.key();
        let tracked = format!("{overlay_id}:{key}");
        let rows = self
            .track_tile(panel, TileLoadKind::Overlays, &tracked, async {
                executor
                    .execute(&resource, query.as_str())
                    .await
                    .map_err(|source| {
                        AppError::from(ViewerError::TileFetch {
                            tile: key.clone(),
                            source,
                        })
                    })
            })
            .await?;
        debug!(tile = %key, rows = rows.len(), mode = ?query.mode, "overlay tile loaded");
        Ok(rows)
    }

    async fn initialize(&self, request: InitRequest) -> Result<usize> {
        let Some(source) = self.context.pixel_source() else {
            let error = self
                .store
                .borrow_mut()
                .fail_initialization(request.generation, ViewerError::MissingPixelSource);
            return Err(error.into());
        };
        let timeout_ms = self.context.config().initialization_timeout_ms;
        let fetch = fetch_channel_stats(source.as_ref(), request.selection, request.bit_depth);
        let outcome = match time::timeout(self.context.config().initialization_timeout(), fetch).await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_ms, channel = %request.channel_id, "channel discovery timed out");
                let error = self.store.borrow_mut().fail_initialization(
                    request.generation,
                    ViewerError::InitializationTimeout { timeout_ms },
                );
                return Err(error.into());
            }
        };
        let panel = self
            .store
            .borrow_mut()
            .complete_initialization(request.generation, outcome)?;
        info!(?panel, "session initialized");
        Ok(panel.ok_or(ViewerError::NotInitialized)?)
    }

    async fn fetch_stats(&self, request: StatsRequest) -> Result<()> {
        let outcome = match self.context.pixel_source() {
            Some(source) => {
                fetch_channel_stats(source.as_ref(), request.selection, request.bit_depth).await
            }
            None => Err(SourceError::Unavailable("pixel source")),
        };
        let failure = outcome.as_ref().err().cloned();
        let applied = self
            .store
            .borrow_mut()
            .complete_channel_stats(request.ticket, outcome);
        debug!(channel = %request.channel_id, applied, "channel statistics applied");
        match failure {
            Some(source) => Err(ViewerError::StatsFetch {
                channel: request.channel_id,
                source,
            }
            .into()),
            None => Ok(()),
        }
    }

    async fn fetch_marker_counts(&self, request: MarkerCountRequest) -> Result<()> {
        let outcome = match self.context.marker_counts() {
            Some(service) => service.marker_counts(&request.resource).await,
            None => Err(SourceError::Unavailable("marker count service")),
        };
        let failure = outcome.as_ref().err().cloned();
        let applied = self
            .store
            .borrow_mut()
            .complete_marker_counts(request.ticket, outcome);
        debug!(overlay = %request.overlay_id, applied, "marker counts applied");
        match failure {
            Some(source) => Err(ViewerError::MarkerCountFetch {
                overlay: request.overlay_id,
                source,
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Releases a tracked tile when its load finishes or is cancelled.
struct TileLoadGuard<'a> {
    store: &'a RefCell<ViewerStore>,
    panel: usize,
    kind: TileLoadKind,
    tile_id: &'a str,
}

impl Drop for TileLoadGuard<'_> {
    fn drop(&mut self) {
        let Ok(mut store) = self.store.try_borrow_mut() else {
            warn!(panel = self.panel, tile = self.tile_id, "store busy, tile left in flight");
            return;
        };
        if let Err(error) = store.finish_tile(self.panel, self.kind, self.tile_id) {
            debug!(
                panel = self.panel,
                tile = self.tile_id,
                %error,
                "panel closed while its tile was loading"
            );
        }
    }
}
