//! Catalog-backed track resolver.
//!
//! Resolves queries against a fixed list of known tracks, usually loaded from
//! a TOML file:
//!
//! ```toml
//! [[tracks]]
//! title = "Clair de Lune"
//! url = "https://www.youtube.com/watch?v=CvFH_6DNRCY"
//! artist = "Debussy"
//! duration_secs = 302
//! ```
//!
//! URLs that are not in the catalog still resolve, as a track titled after
//! the URL with an unknown length.

use async_trait::async_trait;
use jukebox_application::{AudioResolver, ResolveError};
use jukebox_domain::Track;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Could not read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid catalog entry '{title}': {message}")]
    Entry { title: String, message: String },
}

/// One `[[tracks]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub tracks: Vec<CatalogEntry>,
}

impl CatalogEntry {
    fn to_track(&self) -> Result<Track, CatalogError> {
        let mut track = Track::from_url(&self.title, &self.url).map_err(|e| CatalogError::Entry {
            title: self.title.clone(),
            message: e.to_string(),
        })?;
        if let Some(artist) = &self.artist {
            track = track.with_artist(artist);
        }
        if let Some(secs) = self.duration_secs {
            track = track.with_duration(Duration::from_secs(secs));
        }
        Ok(track)
    }
}

pub struct CatalogResolver {
    tracks: Vec<Track>,
}

impl CatalogResolver {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn from_file(file: &CatalogFile) -> Result<Self, CatalogError> {
        let tracks = file
            .tracks
            .iter()
            .map(CatalogEntry::to_track)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tracks))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), tracks = file.tracks.len(), "Loaded catalog");
        Self::from_file(&file)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn matches(track: &Track, needle: &str) -> bool {
        track.title().to_lowercase().contains(needle)
            || track
                .artist()
                .is_some_and(|artist| artist.to_lowercase().contains(needle))
    }
}

#[async_trait]
impl AudioResolver for CatalogResolver {
    async fn resolve(&self, query: &str) -> Result<Track, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::NotFound(String::new()));
        }

        if self.is_url(query) {
            if let Some(track) = self.tracks.iter().find(|t| t.webpage_url() == query) {
                return Ok(track.clone());
            }
            return Track::from_url(query, query).map_err(|e| ResolveError::Failed(e.to_string()));
        }

        self.search(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(query.to_string()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, ResolveError> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|track| Self::matches(track, &needle))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[tracks]]
title = "Clair de Lune"
url = "https://www.youtube.com/watch?v=CvFH_6DNRCY"
artist = "Debussy"
duration_secs = 302

[[tracks]]
title = "Gymnopedie No.1"
url = "https://example.com/gymnopedie"
artist = "Satie"
"#;

    fn resolver() -> CatalogResolver {
        let file: CatalogFile = toml::from_str(CATALOG).unwrap();
        CatalogResolver::from_file(&file).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_by_title_and_artist() {
        let resolver = resolver();
        let track = resolver.resolve("clair").await.unwrap();
        assert_eq!(track.title(), "Clair de Lune");
        assert_eq!(track.id().as_str(), "CvFH_6DNRCY");
        assert_eq!(track.duration(), Some(Duration::from_secs(302)));

        let track = resolver.resolve("satie").await.unwrap();
        assert_eq!(track.title(), "Gymnopedie No.1");
    }

    #[tokio::test]
    async fn test_resolve_unknown_url_and_text() {
        let resolver = resolver();
        let track = resolver.resolve("https://example.com/other").await.unwrap();
        assert_eq!(track.webpage_url(), "https://example.com/other");
        assert!(track.duration().is_none());

        let err = resolver.resolve("mahler").await.unwrap_err();
        assert_eq!(err, ResolveError::NotFound("mahler".to_string()));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let resolver = resolver();
        assert_eq!(resolver.search("e", 10).await.unwrap().len(), 2);
        assert_eq!(resolver.search("e", 1).await.unwrap().len(), 1);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatalogResolver::load(dir.path().join("missing.toml"))
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
