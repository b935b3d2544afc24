//! Shared plumbing for use cases.
//!
//! [`CommandError`] is the error every command returns. [`SessionStore`] and
//! [`GuildGuard`] wrap the lock-load-save-publish sequence each command runs
//! through, so the ordering rules live in one place:
//!
//! ```text
//! lock guild ─> load or create session ─> mutate ─> save ─> voice ─> publish ─> unlock
//! ```

use crate::config::PlaybackConfig;
use crate::ports::audio_resolver::ResolveError;
use crate::ports::event_publisher::EventPublisher;
use crate::ports::voice_transport::VoiceError;
use crate::registry::{GuildSlot, SessionRegistry};
use jukebox_domain::{
    ActiveVotes, DomainError, GuildId, GuildPlaybackSession, SessionRepository, VoteType,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

/// Errors returned by command use cases
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Could not resolve track: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Voice error: {0}")]
    Voice(#[from] VoiceError),

    #[error("You need to be in the voice channel to do that")]
    NotInVoiceChannel,

    #[error("A {0} vote is required")]
    RequiresVote(VoteType),
}

impl CommandError {
    /// Stable error code for the command surface
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Domain(e) => e.code(),
            CommandError::Resolve(ResolveError::NotFound(_)) => "TRACK_NOT_FOUND",
            CommandError::Resolve(ResolveError::Failed(_)) => "RESOLVE_FAILED",
            CommandError::Voice(_) => "VOICE_ERROR",
            CommandError::NotInVoiceChannel => "NOT_IN_VOICE_CHANNEL",
            CommandError::RequiresVote(_) => "REQUIRES_VOTE",
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            CommandError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Entry point to guild state: the registry, the repository and the event sink
#[derive(Clone)]
pub struct SessionStore {
    registry: Arc<SessionRegistry>,
    repository: Arc<dyn SessionRepository>,
    events: Arc<dyn EventPublisher>,
    playback: PlaybackConfig,
}

impl SessionStore {
    pub fn new(
        registry: Arc<SessionRegistry>,
        repository: Arc<dyn SessionRepository>,
        events: Arc<dyn EventPublisher>,
        playback: PlaybackConfig,
    ) -> Self {
        Self {
            registry,
            repository,
            events,
            playback,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn repository(&self) -> &Arc<dyn SessionRepository> {
        &self.repository
    }

    pub fn playback(&self) -> &PlaybackConfig {
        &self.playback
    }

    /// Wait for exclusive access to `guild_id`
    pub async fn lock(&self, guild_id: GuildId) -> GuildGuard {
        let slot = self.registry.lock(guild_id).await;
        let saved_votes = slot.votes.clone();
        GuildGuard {
            guild_id,
            slot,
            saved_votes,
            repository: Arc::clone(&self.repository),
            events: Arc::clone(&self.events),
            playback: self.playback.clone(),
        }
    }
}

/// Exclusive access to one guild for the duration of a command
pub struct GuildGuard {
    guild_id: GuildId,
    slot: OwnedMutexGuard<GuildSlot>,
    /// Votes as of the last successful save (or the lock), unpublished events included
    saved_votes: ActiveVotes,
    repository: Arc<dyn SessionRepository>,
    events: Arc<dyn EventPublisher>,
    playback: PlaybackConfig,
}

impl GuildGuard {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// The cached session, loading it from the repository when needed
    pub async fn load(&mut self) -> Result<Option<&mut GuildPlaybackSession>, CommandError> {
        if self.slot.session.is_none() {
            self.slot.session = self.repository.load(self.guild_id).await?;
        }
        Ok(self.slot.session.as_mut())
    }

    /// The guild's session; a guild without one is an error
    pub async fn session(&mut self) -> Result<&mut GuildPlaybackSession, CommandError> {
        let guild_id = self.guild_id;
        self.load()
            .await?
            .ok_or_else(|| DomainError::not_found("GuildPlaybackSession", guild_id).into())
    }

    /// The guild's session, created with the configured limits if missing
    pub async fn session_or_create(&mut self) -> Result<&mut GuildPlaybackSession, CommandError> {
        if self.load().await?.is_none() {
            debug!(guild = %self.guild_id, "Creating playback session");
            self.slot.session = Some(self.playback.new_session(self.guild_id));
        }
        self.session().await
    }

    /// Session and votes together, for commands that touch both
    pub async fn session_and_votes(
        &mut self,
    ) -> Result<(&mut GuildPlaybackSession, &mut ActiveVotes), CommandError> {
        self.session().await?;
        let slot = &mut *self.slot;
        match slot.session.as_mut() {
            Some(session) => Ok((session, &mut slot.votes)),
            None => Err(DomainError::not_found("GuildPlaybackSession", self.guild_id).into()),
        }
    }

    pub fn votes(&mut self) -> &mut ActiveVotes {
        &mut self.slot.votes
    }

    /// Persist the cached session
    ///
    /// A failed save evicts the cache so the next command reloads the stored
    /// row instead of building on changes that were never written. The votes
    /// go back to their state at the last successful save, dropping the
    /// ballots and events of the failed command.
    pub async fn save(&mut self) -> Result<(), CommandError> {
        let Some(session) = self.slot.session.as_mut() else {
            return Ok(());
        };
        if let Err(e) = self.repository.save(session).await {
            warn!(guild = %self.guild_id, error = %e, "Session save failed, evicting cache");
            self.slot.session = None;
            self.slot.votes = self.saved_votes.clone();
            return Err(e.into());
        }
        self.saved_votes = self.slot.votes.clone();
        Ok(())
    }

    /// Settle the voice call that should have started the current track
    ///
    /// When the stream never began, the current track is dropped and the
    /// session saved as idle, so the guild does not stay Playing while no
    /// completion signal can arrive. The voice error is handed back.
    pub async fn settle_start(
        &mut self,
        result: Result<(), VoiceError>,
    ) -> Result<(), VoiceError> {
        let Err(error) = result else {
            return Ok(());
        };
        let Some(session) = self.slot.session.as_mut() else {
            return Err(error);
        };

        match session.abandon_current(error.to_string()) {
            Ok(Some(track)) => {
                warn!(
                    guild = %self.guild_id,
                    track = %track.title(),
                    error = %error,
                    "Stream did not start, session back to idle"
                );
                if let Err(e) = self.save().await {
                    warn!(guild = %self.guild_id, error = %e, "Could not persist idle session");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(guild = %self.guild_id, error = %e, "Could not reset playback"),
        }
        Err(error)
    }

    /// Publish pending vote events, then session events, in raise order
    pub fn publish_pending(&mut self) {
        self.saved_votes.take_events();
        let mut events = self.slot.votes.take_events();
        if let Some(session) = self.slot.session.as_mut() {
            events.extend(session.take_events());
        }
        for event in &events {
            self.events.publish(event);
        }
    }

    /// Save, then publish
    pub async fn commit(&mut self) -> Result<(), CommandError> {
        self.save().await?;
        self.publish_pending();
        Ok(())
    }

    /// Delete the stored session and forget the cached state
    pub async fn delete(&mut self) -> Result<bool, CommandError> {
        let removed = self.repository.delete(self.guild_id).await?;
        self.slot.clear();
        self.saved_votes = ActiveVotes::new();
        Ok(removed)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::ports::event_publisher::NoEventPublisher;

    fn store(repository: Arc<MockRepository>) -> SessionStore {
        SessionStore::new(
            Arc::new(SessionRegistry::new()),
            repository,
            Arc::new(NoEventPublisher),
            PlaybackConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_session_requires_existing_row() {
        let store = store(Arc::new(MockRepository::default()));
        let mut guard = store.lock(guild(1)).await;

        let err = guard.session().await.unwrap_err();
        assert_eq!(err.code(), "ENTITY_NOT_FOUND");

        guard.session_or_create().await.unwrap();
        assert!(guard.session().await.is_ok());
    }

    #[tokio::test]
    async fn test_stale_save_is_a_concurrency_error_and_evicts_cache() {
        let repository = Arc::new(MockRepository::default());
        let store = store(repository.clone());
        let mut guard = store.lock(guild(1)).await;
        guard.session_or_create().await.unwrap();
        guard.commit().await.unwrap();

        // Another writer moves the stored row ahead
        {
            let mut rows = repository.rows.lock().unwrap();
            if let Some(row) = rows.get_mut(&guild(1)) {
                row.bump_version();
            }
        }

        guard.session().await.unwrap().enqueue(track("A")).unwrap();
        let err = guard.save().await.unwrap_err();
        assert_eq!(err.code(), "CONCURRENCY_ERROR");

        // Reloaded from the stored row, without the unsaved enqueue
        let reloaded = guard.session().await.unwrap();
        assert_eq!(reloaded.queue_len(), 0);
        assert_eq!(reloaded.version(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_votes_back() {
        let repository = Arc::new(MockRepository::default());
        let store = store(repository.clone());
        let mut guard = store.lock(guild(1)).await;
        guard.session_or_create().await.unwrap();
        guard.commit().await.unwrap();

        {
            let mut rows = repository.rows.lock().unwrap();
            if let Some(row) = rows.get_mut(&guild(1)) {
                row.bump_version();
            }
        }

        jukebox_domain::VotingDomainService::new()
            .open(
                guard.votes(),
                guild(1),
                VoteType::Clear,
                user(1),
                4,
                None,
                chrono::Utc::now(),
            )
            .unwrap();
        assert!(guard.save().await.is_err());

        assert!(guard.votes().is_empty());
        assert!(guard.votes().take_events().is_empty());
    }
}
