//! Domain events raised by the session aggregate and the voting service
//!
//! Events are descriptive facts. The aggregate buffers them in raise order and
//! the application layer drains them after a command completes.

use crate::core::ids::{GuildId, UserId};
use crate::music::track::TrackId;
use crate::music::value_objects::LoopMode;
use crate::voting::value_objects::{VoteStatus, VoteType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    TrackQueued {
        track_id: TrackId,
        title: String,
        position: usize,
        requested_by: Option<UserId>,
    },
    TrackStarted {
        track_id: TrackId,
        title: String,
        url: String,
        duration_secs: Option<u64>,
    },
    TrackFinished {
        track_id: TrackId,
        title: String,
        skipped: bool,
    },
    TrackRemoved {
        track_id: TrackId,
        position: usize,
    },
    QueueCleared {
        track_count: usize,
    },
    QueueShuffled {
        track_count: usize,
    },
    QueueExhausted {
        last_track_id: Option<TrackId>,
    },
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    /// The stream for the current track never started
    PlaybackFailed {
        track_id: TrackId,
        title: String,
        reason: String,
    },
    LoopModeChanged {
        mode: LoopMode,
    },
    VolumeChanged {
        volume: f32,
    },
    VoteStarted {
        vote_type: VoteType,
        initiator: UserId,
        required: usize,
    },
    VoteCast {
        vote_type: VoteType,
        voter: UserId,
        approvals: usize,
        required: usize,
    },
    VoteResolved {
        vote_type: VoteType,
        status: VoteStatus,
        approvals: usize,
    },
}

impl SessionEventKind {
    /// Stable name, used as the record type in event logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionEventKind::TrackQueued { .. } => "track_queued",
            SessionEventKind::TrackStarted { .. } => "track_started",
            SessionEventKind::TrackFinished { .. } => "track_finished",
            SessionEventKind::TrackRemoved { .. } => "track_removed",
            SessionEventKind::QueueCleared { .. } => "queue_cleared",
            SessionEventKind::QueueShuffled { .. } => "queue_shuffled",
            SessionEventKind::QueueExhausted { .. } => "queue_exhausted",
            SessionEventKind::PlaybackPaused => "playback_paused",
            SessionEventKind::PlaybackResumed => "playback_resumed",
            SessionEventKind::PlaybackStopped => "playback_stopped",
            SessionEventKind::PlaybackFailed { .. } => "playback_failed",
            SessionEventKind::LoopModeChanged { .. } => "loop_mode_changed",
            SessionEventKind::VolumeChanged { .. } => "volume_changed",
            SessionEventKind::VoteStarted { .. } => "vote_started",
            SessionEventKind::VoteCast { .. } => "vote_cast",
            SessionEventKind::VoteResolved { .. } => "vote_resolved",
        }
    }
}

/// A domain event scoped to one guild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub guild_id: GuildId,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn new(guild_id: GuildId, kind: SessionEventKind) -> Self {
        Self {
            guild_id,
            occurred_at: Utc::now(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}
