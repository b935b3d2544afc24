//! Session repository trait

use crate::core::error::DomainError;
use crate::core::ids::GuildId;
use crate::music::session::GuildPlaybackSession;
use async_trait::async_trait;

/// Durable storage for guild sessions
///
/// `save` performs an optimistic concurrency check: the stored row's version
/// must equal the version the caller loaded, otherwise the save fails with
/// [`DomainError::Concurrency`] and nothing is written. On success the
/// repository bumps the session's version in place.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self, guild_id: GuildId) -> Result<Option<GuildPlaybackSession>, DomainError>;

    async fn save(&self, session: &mut GuildPlaybackSession) -> Result<(), DomainError>;

    /// Returns whether a row was removed
    async fn delete(&self, guild_id: GuildId) -> Result<bool, DomainError>;

    async fn list_guilds(&self) -> Result<Vec<GuildId>, DomainError>;
}
