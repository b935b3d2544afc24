//! Playback parameters: queue limits and session lifetime.
//!
//! [`PlaybackConfig`] groups the static parameters the playback use cases and
//! the reaper read. These are application-layer concerns; the domain only
//! sees the values handed to it (max queue size, initial volume).

use jukebox_domain::{GuildId, GuildPlaybackSession, QueueDomainService, Volume};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pending tracks allowed per guild.
    pub max_queue_size: usize,
    /// Longest track accepted into the queue.
    pub max_track_duration: Duration,
    /// Volume a new session starts with.
    pub default_volume: Volume,
    /// Idle sessions older than this are reaped.
    pub inactivity_timeout: Duration,
    /// How often the reaper sweeps.
    pub reaper_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_queue_size: QueueDomainService::DEFAULT_MAX_QUEUE_SIZE,
            max_track_duration: QueueDomainService::DEFAULT_MAX_TRACK_DURATION,
            default_volume: Volume::default(),
            inactivity_timeout: Duration::from_secs(30 * 60),
            reaper_interval: Duration::from_secs(60),
        }
    }
}

impl PlaybackConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_queue_size(mut self, max: usize) -> Self {
        self.max_queue_size = max;
        self
    }

    pub fn with_max_track_duration(mut self, max: Duration) -> Self {
        self.max_track_duration = max;
        self
    }

    pub fn with_default_volume(mut self, volume: Volume) -> Self {
        self.default_volume = volume;
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = interval;
        self
    }

    /// Fresh session for `guild_id` using these limits
    pub fn new_session(&self, guild_id: GuildId) -> GuildPlaybackSession {
        GuildPlaybackSession::new(guild_id)
            .with_max_queue_size(self.max_queue_size)
            .with_volume(self.default_volume)
    }
}
