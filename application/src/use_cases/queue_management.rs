//! Queue management use case
//!
//! Edits the pending queue of a guild. Positions are 0-based and validated
//! against the queue as it is when the guild lock is held.

use crate::use_cases::shared::{CommandError, SessionStore};
use jukebox_domain::{GuildId, Track};
use tracing::debug;

pub struct QueueManagementUseCase {
    store: SessionStore,
}

impl QueueManagementUseCase {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub async fn remove_at(&self, guild_id: GuildId, index: usize) -> Result<Track, CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        let removed = guard.session().await?.remove_at(index)?;
        guard.commit().await?;
        debug!(guild = %guild_id, index, track = %removed.title(), "Removed from queue");
        Ok(removed)
    }

    /// Returns how many tracks were dropped
    pub async fn clear(&self, guild_id: GuildId) -> Result<usize, CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        let count = guard.session().await?.clear_queue();
        guard.commit().await?;
        Ok(count)
    }

    /// Returns how many tracks were shuffled
    pub async fn shuffle(&self, guild_id: GuildId) -> Result<usize, CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        let session = guard.session().await?;
        session.shuffle(&mut rand::thread_rng());
        let count = session.queue_len();
        guard.commit().await?;
        Ok(count)
    }

    pub async fn move_track(
        &self,
        guild_id: GuildId,
        from: usize,
        to: usize,
    ) -> Result<(), CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        guard.session().await?.move_track(from, to)?;
        guard.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::ports::event_publisher::NoEventPublisher;
    use crate::registry::SessionRegistry;
    use crate::use_cases::shared::test_support::*;
    use jukebox_domain::{DomainError, GuildPlaybackSession, SessionRepository, ValidationError};
    use std::sync::Arc;

    async fn use_case_with(names: &[&str]) -> (QueueManagementUseCase, SessionStore) {
        let repository = Arc::new(MockRepository::default());
        let mut session = GuildPlaybackSession::new(guild(1));
        for name in names {
            session.enqueue(track(name)).unwrap();
        }
        repository.save(&mut session).await.unwrap();

        let store = SessionStore::new(
            Arc::new(SessionRegistry::new()),
            repository,
            Arc::new(NoEventPublisher),
            PlaybackConfig::default(),
        );
        (QueueManagementUseCase::new(store.clone()), store)
    }

    async fn titles(store: &SessionStore) -> Vec<String> {
        let mut guard = store.lock(guild(1)).await;
        guard
            .session()
            .await
            .unwrap()
            .queue()
            .iter()
            .map(|t| t.title().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_remove_at_uses_zero_based_positions() {
        let (use_case, store) = use_case_with(&["A", "B", "C"]).await;

        let err = use_case.remove_at(guild(1), 5).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(DomainError::Validation(ValidationError::OutOfRange {
                position: 5,
                len: 3
            }))
        ));
        assert_eq!(titles(&store).await, vec!["A", "B", "C"]);

        let removed = use_case.remove_at(guild(1), 1).await.unwrap();
        assert_eq!(removed.title(), "B");
        assert_eq!(titles(&store).await, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_clear_and_shuffle() {
        let (use_case, store) = use_case_with(&["A", "B", "C", "D"]).await;
        assert_eq!(use_case.shuffle(guild(1)).await.unwrap(), 4);

        let mut shuffled = titles(&store).await;
        shuffled.sort();
        assert_eq!(shuffled, vec!["A", "B", "C", "D"]);

        assert_eq!(use_case.clear(guild(1)).await.unwrap(), 4);
        assert!(titles(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_move_track() {
        let (use_case, store) = use_case_with(&["A", "B", "C"]).await;
        use_case.move_track(guild(1), 2, 0).await.unwrap();
        assert_eq!(titles(&store).await, vec!["C", "A", "B"]);

        assert!(use_case.move_track(guild(1), 0, 9).await.is_err());
        assert_eq!(titles(&store).await, vec!["C", "A", "B"]);
    }
}
