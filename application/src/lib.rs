//! Application layer for guild-jukebox
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use config::{PlaybackConfig, VotingConfig};
pub use ports::{
    audio_resolver::{AudioResolver, ResolveError},
    event_publisher::{CompositeEventPublisher, EventPublisher, NoEventPublisher},
    voice_transport::{VoiceError, VoiceTransport},
};
pub use registry::{GuildSlot, SessionRegistry};
pub use use_cases::play_track::{PlayTrackInput, PlayTrackOutput, PlayTrackUseCase};
pub use use_cases::playback_control::{
    PlaybackControlUseCase, SkipInput, SkipOutput, StopInput,
};
pub use use_cases::queries::{
    GetCurrentTrackQuery, GetQueueQuery, NowPlaying, QueueSnapshot, VoteSummary,
};
pub use use_cases::queue_management::QueueManagementUseCase;
pub use use_cases::reaper::{ReapReport, SessionReaper};
pub use use_cases::shared::{CommandError, GuildGuard, SessionStore};
pub use use_cases::track_end::{EndReason, TrackEndOutcome, TrackEndSignal, TrackEndUseCase};
pub use use_cases::vote::{CastVoteInput, VoteOutcome, VoteUseCase};
