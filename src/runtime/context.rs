use std::fmt;
use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::sources::{MarkerCountService, MetadataProvider, PixelSource, QueryExecutor};

/// Configuration plus the external collaborators a session talks to.
#[derive(Clone, Default)]
pub struct ViewerContext {
    config: ViewerConfig,
    pixel_source: Option<Arc<dyn PixelSource>>,
    metadata_provider: Option<Arc<dyn MetadataProvider>>,
    marker_counts: Option<Arc<dyn MarkerCountService>>,
    query_executor: Option<Arc<dyn QueryExecutor>>,
}

impl ViewerContext {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_pixel_source(mut self, source: Arc<dyn PixelSource>) -> Self {
        self.pixel_source = Some(source);
        self
    }

    pub fn with_metadata_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata_provider = Some(provider);
        self
    }

    pub fn with_marker_counts(mut self, service: Arc<dyn MarkerCountService>) -> Self {
        self.marker_counts = Some(service);
        self
    }

    pub fn with_query_executor(mut self, executor: Arc<dyn QueryExecutor>) -> Self {
        self.query_executor = Some(executor);
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn pixel_source(&self) -> Option<&Arc<dyn PixelSource>> {
        self.pixel_source.as_ref()
    }

    pub fn metadata_provider(&self) -> Option<&Arc<dyn MetadataProvider>> {
        self.metadata_provider.as_ref()
    }

    pub fn marker_counts(&self) -> Option<&Arc<dyn MarkerCountService>> {
        self.marker_counts.as_ref()
    }

    pub fn query_executor(&self) -> Option<&Arc<dyn QueryExecutor>> {
        self.query_executor.as_ref()
    }
}

impl fmt::Debug for ViewerContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ViewerContext")
            .field("config", &self.config)
            .field("pixel_source", &self.pixel_source.is_some())
            .field("metadata_provider", &self.metadata_provider.is_some())
            .field("marker_counts", &self.marker_counts.is_some())
            .field("query_executor", &self.query_executor.is_some())
            .finish()
    }
}
