//! Track value objects

use crate::core::error::{DomainError, ValidationError};
use crate::core::ids::UserId;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

static YOUTUBE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})")
            .expect("valid youtube pattern"),
        Regex::new(r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})").expect("valid shorts pattern"),
    ]
});

/// Stable identity of a playable source (Value Object)
///
/// The same source URL always yields the same id, which is what duplicate
/// detection and history lookups key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyTrackId.into());
        }
        Ok(Self(id))
    }

    /// Derive an id from a source URL
    ///
    /// YouTube links map to their 11-character video id; anything else maps
    /// to the first 16 hex digits of the URL's MD5 digest.
    pub fn from_url(url: &str) -> Self {
        for pattern in YOUTUBE_PATTERNS.iter() {
            if let Some(id) = pattern.captures(url).and_then(|c| c.get(1)) {
                return Self(id.as_str().to_string());
            }
        }

        let digest = Md5::digest(url.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who asked for a track, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: UserId,
    pub user_name: String,
    pub requested_at: DateTime<Utc>,
}

/// A resolved, playable track (Value Object)
///
/// Immutable once built. Re-queueing or attaching a requester produces a new
/// value that keeps the same [`TrackId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    id: TrackId,
    title: String,
    webpage_url: String,
    stream_url: Option<String>,
    duration: Option<Duration>,
    thumbnail_url: Option<String>,
    artist: Option<String>,
    uploader: Option<String>,
    requester: Option<Requester>,
    from_recommendation: bool,
}

impl Track {
    pub fn new(
        id: TrackId,
        title: impl Into<String>,
        webpage_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let webpage_url = webpage_url.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        if webpage_url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl.into());
        }

        Ok(Self {
            id,
            title,
            webpage_url,
            stream_url: None,
            duration: None,
            thumbnail_url: None,
            artist: None,
            uploader: None,
            requester: None,
            from_recommendation: false,
        })
    }

    /// Build a track whose id is derived from its URL
    pub fn from_url(
        title: impl Into<String>,
        webpage_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let webpage_url = webpage_url.into();
        Self::new(TrackId::from_url(&webpage_url), title, webpage_url)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    pub fn as_recommendation(mut self) -> Self {
        self.from_recommendation = true;
        self
    }

    /// Copy of this track with requester metadata attached
    pub fn with_requester(
        &self,
        user_id: UserId,
        user_name: impl Into<String>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            requester: Some(Requester {
                user_id,
                user_name: user_name.into(),
                requested_at,
            }),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn webpage_url(&self) -> &str {
        &self.webpage_url
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.stream_url.as_deref()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    pub fn uploader(&self) -> Option<&str> {
        self.uploader.as_deref()
    }

    pub fn requester(&self) -> Option<&Requester> {
        self.requester.as_ref()
    }

    pub fn is_from_recommendation(&self) -> bool {
        self.from_recommendation
    }

    pub fn was_requested_by(&self, user_id: UserId) -> bool {
        self.requester.as_ref().is_some_and(|r| r.user_id == user_id)
    }

    /// Duration as `M:SS` or `H:MM:SS`
    pub fn duration_formatted(&self) -> String {
        match self.duration {
            Some(duration) => format_clock(duration.as_secs()),
            None => "Unknown".to_string(),
        }
    }

    /// Title with the duration appended when known
    pub fn display_title(&self) -> String {
        match self.duration {
            Some(d) if d.as_secs() > 0 => format!("{} [{}]", self.title, self.duration_formatted()),
            _ => self.title.clone(),
        }
    }
}

fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
