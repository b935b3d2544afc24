//! Voice transport port
//!
//! Streams audio into a guild's voice channel. The core treats it as an
//! opaque side effect: it never reads playback state back from the
//! transport, and completion is reported separately through
//! [`TrackEndUseCase`](crate::use_cases::track_end::TrackEndUseCase).

use async_trait::async_trait;
use jukebox_domain::{ChannelId, GuildId, Track, UserId, Volume};
use thiserror::Error;

/// Errors that can occur during voice operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoiceError {
    #[error("Not connected to a voice channel in guild {0}")]
    NotConnected(GuildId),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Audio output for guild voice channels
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceError>;

    /// Start streaming `track`, replacing whatever was playing
    async fn play(&self, guild_id: GuildId, track: &Track) -> Result<(), VoiceError>;

    async fn pause(&self, guild_id: GuildId) -> Result<(), VoiceError>;

    async fn resume(&self, guild_id: GuildId) -> Result<(), VoiceError>;

    async fn stop(&self, guild_id: GuildId) -> Result<(), VoiceError>;

    async fn set_volume(&self, guild_id: GuildId, volume: Volume) -> Result<(), VoiceError>;

    async fn leave(&self, guild_id: GuildId) -> Result<(), VoiceError>;

    /// Non-bot members of the guild's voice channel (the eligible voters)
    async fn listeners(&self, guild_id: GuildId) -> Result<Vec<UserId>, VoiceError>;
}
