//! Read-only queries
//!
//! Snapshots are taken under the guild lock so they never observe a command
//! half way through.

use crate::use_cases::shared::{CommandError, SessionStore};
use chrono::{DateTime, Utc};
use jukebox_domain::{
    GuildId, GuildPlaybackSession, LoopMode, PlaybackState, QueueDomainService, Track, Volume,
    VoteSession, VoteType,
};
use std::time::Duration;

/// An open vote as shown to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct VoteSummary {
    pub vote_type: VoteType,
    pub approvals: usize,
    pub required: usize,
    pub expires_at: DateTime<Utc>,
}

impl From<&VoteSession> for VoteSummary {
    fn from(vote: &VoteSession) -> Self {
        Self {
            vote_type: vote.vote_type(),
            approvals: vote.approvals(),
            required: vote.required(),
            expires_at: vote.expires_at(),
        }
    }
}

/// Full view of a guild's queue
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub current: Option<Track>,
    pub tracks: Vec<Track>,
    pub state: PlaybackState,
    pub loop_mode: LoopMode,
    pub volume: Volume,
    /// `None` when any track's length is unknown
    pub total_duration: Option<Duration>,
    pub votes: Vec<VoteSummary>,
}

impl QueueSnapshot {
    fn empty() -> Self {
        Self {
            current: None,
            tracks: Vec::new(),
            state: PlaybackState::Idle,
            loop_mode: LoopMode::Off,
            volume: Volume::default(),
            total_duration: Some(Duration::ZERO),
            votes: Vec::new(),
        }
    }

    fn of(session: &GuildPlaybackSession, votes: Vec<VoteSummary>) -> Self {
        Self {
            current: session.current_track().cloned(),
            tracks: session.queue().iter().cloned().collect(),
            state: session.state(),
            loop_mode: session.loop_mode(),
            volume: session.volume(),
            total_duration: QueueDomainService::total_duration(session.queue()),
            votes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.tracks.is_empty()
    }
}

pub struct GetQueueQuery {
    store: SessionStore,
}

impl GetQueueQuery {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// A guild without a session reports an empty idle queue
    pub async fn execute(&self, guild_id: GuildId) -> Result<QueueSnapshot, CommandError> {
        let now = Utc::now();
        let mut guard = self.store.lock(guild_id).await;
        let votes: Vec<VoteSummary> = guard
            .votes()
            .iter()
            .filter(|v| v.is_open() && !v.is_past_expiry(now))
            .map(VoteSummary::from)
            .collect();

        Ok(match guard.load().await? {
            Some(session) => QueueSnapshot::of(session, votes),
            None => QueueSnapshot::empty(),
        })
    }
}

/// What is playing right now
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub track: Track,
    pub state: PlaybackState,
    pub volume: Volume,
    pub loop_mode: LoopMode,
    pub up_next: Option<Track>,
}

pub struct GetCurrentTrackQuery {
    store: SessionStore,
}

impl GetCurrentTrackQuery {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub async fn execute(&self, guild_id: GuildId) -> Result<Option<NowPlaying>, CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        let Some(session) = guard.load().await? else {
            return Ok(None);
        };

        Ok(session.current_track().map(|track| NowPlaying {
            track: track.clone(),
            state: session.state(),
            volume: session.volume(),
            loop_mode: session.loop_mode(),
            up_next: QueueDomainService::peek_next(session).cloned(),
        }))
    }
}
