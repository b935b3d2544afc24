//! Per-guild session registry
//!
//! Every guild gets its own async mutex. A command holds its guild's lock for
//! the whole load-validate-mutate-save sequence, which serializes commands on
//! one guild while leaving other guilds untouched. There is no global lock:
//! the map itself is a sharded [`DashMap`], and its shard guards are never
//! held across an `.await`.

use dashmap::DashMap;
use jukebox_domain::{ActiveVotes, GuildId, GuildPlaybackSession};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// State guarded by one guild's lock
#[derive(Debug, Default)]
pub struct GuildSlot {
    /// Cached aggregate; `None` until loaded or after a failed save
    pub session: Option<GuildPlaybackSession>,
    pub votes: ActiveVotes,
}

impl GuildSlot {
    /// Forget everything cached for the guild
    pub fn clear(&mut self) {
        self.session = None;
        self.votes = ActiveVotes::new();
    }
}

/// Map of guild locks
#[derive(Default)]
pub struct SessionRegistry {
    slots: DashMap<GuildId, Arc<Mutex<GuildSlot>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The guild's slot, created on first use
    pub fn slot(&self, guild_id: GuildId) -> Arc<Mutex<GuildSlot>> {
        self.slots
            .entry(guild_id)
            .or_insert_with(|| {
                debug!(guild = %guild_id, "Creating guild slot");
                Arc::new(Mutex::new(GuildSlot::default()))
            })
            .clone()
    }

    /// Wait for exclusive access to the guild
    pub async fn lock(&self, guild_id: GuildId) -> OwnedMutexGuard<GuildSlot> {
        self.slot(guild_id).lock_owned().await
    }

    /// Drop the guild's slot if nobody else holds or awaits it
    pub fn remove_if_unused(&self, guild_id: GuildId) -> bool {
        self.slots
            .remove_if(&guild_id, |_, slot| Arc::strong_count(slot) == 1)
            .is_some()
    }

    pub fn guilds(&self) -> Vec<GuildId> {
        self.slots.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
