//! Audio resolver port
//!
//! Turns a user query (a URL or free-text search) into playable track
//! metadata. Resolution can be slow, so use cases call it before taking the
//! guild lock.

use async_trait::async_trait;
use jukebox_domain::Track;
use thiserror::Error;

/// Errors that can occur while resolving a query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("No track found for '{0}'")]
    NotFound(String),

    #[error("Resolution failed: {0}")]
    Failed(String),
}

/// Resolves queries into tracks
#[async_trait]
pub trait AudioResolver: Send + Sync {
    /// Resolve a URL or the best search match
    async fn resolve(&self, query: &str) -> Result<Track, ResolveError>;

    /// Up to `limit` search matches, best first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, ResolveError>;

    /// Whether `query` looks like a direct URL rather than search text
    fn is_url(&self, query: &str) -> bool {
        let query = query.trim();
        query.starts_with("http://") || query.starts_with("https://")
    }
}
