use async_trait::async_trait;

use crate::{common::errors::ResolveError, protocol::tracks::TrackInfo};

/// Trait that all source plugins must implement.
///
/// A source either loads a direct resource identifier it recognises, or
/// answers a free-text search with its best matches, best first.
#[async_trait]
pub trait SourcePlugin: Send + Sync {
    /// Unique identifier for this source (e.g., "http", "local")
    fn name(&self) -> &str;

    /// Whether `identifier` is a direct resource this source can load.
    fn can_handle(&self, identifier: &str) -> bool;

    /// Load metadata for a direct resource identifier.
    async fn load(&self, identifier: &str) -> Result<TrackInfo, ResolveError>;

    /// Free-text search. Sources that cannot search return no candidates.
    async fn search(&self, _query: &str) -> Result<Vec<TrackInfo>, ResolveError> {
        Ok(Vec::new())
    }
}

pub type BoxedSource = Box<dyn SourcePlugin>;

/// What a playback session needs to turn a query into track metadata.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<TrackInfo, ResolveError>;
}
