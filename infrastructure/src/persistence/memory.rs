//! In-memory session repository.
//!
//! Rows live in a [`DashMap`] keyed by guild. Saves are versioned: a session
//! whose version differs from the stored row was loaded before someone else
//! saved, and is rejected with [`DomainError::Concurrency`].

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jukebox_domain::{DomainError, GuildId, GuildPlaybackSession, SessionRepository};
use tracing::trace;

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    rows: DashMap<GuildId, GuildPlaybackSession>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn load(&self, guild_id: GuildId) -> Result<Option<GuildPlaybackSession>, DomainError> {
        Ok(self.rows.get(&guild_id).map(|row| row.value().clone()))
    }

    async fn save(&self, session: &mut GuildPlaybackSession) -> Result<(), DomainError> {
        match self.rows.entry(session.guild_id()) {
            Entry::Occupied(mut occupied) => {
                let stored = occupied.get().version();
                if stored != session.version() {
                    return Err(DomainError::Concurrency {
                        entity: "GuildPlaybackSession",
                        message: format!(
                            "guild {} is at version {}, save was based on {}",
                            session.guild_id(),
                            stored,
                            session.version()
                        ),
                    });
                }
                session.bump_version();
                occupied.insert(Self::row(session));
            }
            Entry::Vacant(vacant) => {
                session.bump_version();
                vacant.insert(Self::row(session));
            }
        }
        trace!(guild = %session.guild_id(), version = session.version(), "Session saved");
        Ok(())
    }

    async fn delete(&self, guild_id: GuildId) -> Result<bool, DomainError> {
        Ok(self.rows.remove(&guild_id).is_some())
    }

    async fn list_guilds(&self) -> Result<Vec<GuildId>, DomainError> {
        Ok(self.rows.iter().map(|row| *row.key()).collect())
    }
}

impl InMemorySessionRepository {
    /// Stored copy without undrained events
    fn row(session: &GuildPlaybackSession) -> GuildPlaybackSession {
        let mut row = session.clone();
        row.take_events();
        row
    }
}
