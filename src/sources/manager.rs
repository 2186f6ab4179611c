use async_trait::async_trait;

use super::{
    http::HttpSource,
    local::LocalSource,
    plugin::{BoxedSource, SourcePlugin, TrackResolver},
};
use crate::{common::errors::ResolveError, protocol::tracks::TrackInfo};

/// Source Manager
pub struct SourceManager {
    pub sources: Vec<BoxedSource>,
}

impl SourceManager {
    /// Create a SourceManager with the sources enabled in `config`.
    pub fn new(config: &crate::configs::Config) -> Self {
        let mut sources: Vec<BoxedSource> = Vec::new();

        macro_rules! register_source {
            ($enabled:expr, $name:literal, $ctor:expr) => {
                if $enabled {
                    match $ctor {
                        Ok(src) => {
                            tracing::info!("Loaded source: {}", $name);
                            sources.push(Box::new(src));
                        }
                        Err(e) => {
                            tracing::error!("{} source failed to initialize: {}", $name, e);
                        }
                    }
                }
            };
        }

        register_source!(
            config.sources.local,
            "local",
            LocalSource::new(
                config.sources.local_library.as_deref(),
                config.sources.search_limit
            )
        );
        register_source!(config.sources.http, "http", HttpSource::new());

        Self { sources }
    }

    pub fn with_sources(sources: Vec<BoxedSource>) -> Self {
        Self { sources }
    }

    fn direct_source(&self, identifier: &str) -> Option<&dyn SourcePlugin> {
        self.sources
            .iter()
            .find(|s| s.can_handle(identifier))
            .map(|s| s.as_ref())
    }
}

#[async_trait]
impl TrackResolver for SourceManager {
    /// Direct identifiers go to the first source that recognises them;
    /// anything else is searched across sources in order and the first hit
    /// wins.
    async fn resolve(&self, query: &str) -> Result<TrackInfo, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::NotFound(String::new()));
        }

        if let Some(source) = self.direct_source(query) {
            tracing::trace!("Loading '{}' with source: {}", query, source.name());
            return source.load(query).await;
        }

        let mut last_error = None;
        for source in &self.sources {
            match source.search(query).await {
                Ok(results) => {
                    if let Some(first) = results.into_iter().next() {
                        tracing::debug!(
                            "Search '{}' matched '{}' via {}",
                            query,
                            first.title,
                            source.name()
                        );
                        return Ok(first);
                    }
                }
                Err(e) => {
                    tracing::warn!("Search '{}' failed on {}: {}", query, source.name(), e);
                    last_error = Some(e);
                }
            }
        }

        tracing::debug!("No source produced a result for: {}", query);
        Err(last_error.unwrap_or_else(|| ResolveError::NotFound(query.to_string())))
    }
}
