//! Domain layer for guild-jukebox
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Guild playback session
//!
//! Each guild owns one [`GuildPlaybackSession`]: a current track, a queue of
//! pending tracks and a playback state machine
//! (`Idle -> Playing <-> Paused -> Stopped -> Idle`).
//!
//! ## Voting
//!
//! Listeners decide on skip / stop / clear by vote. A [`VoteSession`] counts
//! distinct approvals against a threshold snapshotted when the vote opened,
//! and [`VoteResultHandler`] applies an approved outcome exactly once.

pub mod config;
pub mod core;
pub mod events;
pub mod music;
pub mod voting;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use core::{
    error::{BusinessRule, DomainError, ValidationError},
    ids::{ChannelId, GuildId, UserId},
};
pub use events::{SessionEvent, SessionEventKind};
pub use music::{
    GuildPlaybackSession, LoopMode, PlaybackDomainService, PlaybackState, QueueDomainService,
    QueuePosition, Requester, SessionRepository, Track, TrackId, Volume,
};
pub use voting::{
    ActiveVotes, CastOutcome, RejectionPolicy, ThresholdPolicy, Vote, VoteChoice, VoteEffect,
    VoteResultHandler, VoteSession, VoteStatus, VoteType, VotingDomainService,
};
