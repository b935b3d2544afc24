//! In-process voice transport.
//!
//! Keeps per-guild connection state instead of streaming audio. Used by the
//! command-script runner and by tests; listeners are managed explicitly with
//! [`SimulatedVoiceTransport::add_listener`].

use async_trait::async_trait;
use dashmap::DashMap;
use jukebox_application::{VoiceError, VoiceTransport};
use jukebox_domain::{ChannelId, GuildId, Track, UserId, Volume};
use tracing::{debug, info};

/// Connection state of one guild
#[derive(Debug, Clone)]
pub struct VoiceConnection {
    pub channel_id: ChannelId,
    pub now_playing: Option<Track>,
    pub paused: bool,
    pub volume: Volume,
}

#[derive(Debug, Default)]
pub struct SimulatedVoiceTransport {
    connections: DashMap<GuildId, VoiceConnection>,
    listeners: DashMap<GuildId, Vec<UserId>>,
}

impl SimulatedVoiceTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, guild_id: GuildId, user_id: UserId) {
        let mut members = self.listeners.entry(guild_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }

    pub fn remove_listener(&self, guild_id: GuildId, user_id: UserId) -> bool {
        match self.listeners.get_mut(&guild_id) {
            Some(mut members) => {
                let before = members.len();
                members.retain(|id| *id != user_id);
                members.len() != before
            }
            None => false,
        }
    }

    pub fn connection(&self, guild_id: GuildId) -> Option<VoiceConnection> {
        self.connections.get(&guild_id).map(|c| c.value().clone())
    }

    /// Track currently streaming in the guild, if any
    pub fn now_playing(&self, guild_id: GuildId) -> Option<Track> {
        self.connections
            .get(&guild_id)
            .and_then(|c| c.now_playing.clone())
    }

    fn with_connection<T>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut VoiceConnection) -> T,
    ) -> Result<T, VoiceError> {
        let mut connection = self
            .connections
            .get_mut(&guild_id)
            .ok_or(VoiceError::NotConnected(guild_id))?;
        Ok(f(&mut connection))
    }
}

#[async_trait]
impl VoiceTransport for SimulatedVoiceTransport {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceError> {
        self.connections
            .entry(guild_id)
            .and_modify(|c| c.channel_id = channel_id)
            .or_insert_with(|| VoiceConnection {
                channel_id,
                now_playing: None,
                paused: false,
                volume: Volume::default(),
            });
        debug!(guild = %guild_id, channel = %channel_id, "Joined voice channel");
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, track: &Track) -> Result<(), VoiceError> {
        self.with_connection(guild_id, |c| {
            c.now_playing = Some(track.clone());
            c.paused = false;
        })?;
        info!(guild = %guild_id, track = %track.display_title(), "Streaming");
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> Result<(), VoiceError> {
        self.with_connection(guild_id, |c| c.paused = true)
    }

    async fn resume(&self, guild_id: GuildId) -> Result<(), VoiceError> {
        self.with_connection(guild_id, |c| c.paused = false)
    }

    /// No-op when not connected
    async fn stop(&self, guild_id: GuildId) -> Result<(), VoiceError> {
        if let Some(mut connection) = self.connections.get_mut(&guild_id) {
            connection.now_playing = None;
            connection.paused = false;
        }
        Ok(())
    }

    async fn set_volume(&self, guild_id: GuildId, volume: Volume) -> Result<(), VoiceError> {
        self.with_connection(guild_id, |c| c.volume = volume)
    }

    /// No-op when not connected
    async fn leave(&self, guild_id: GuildId) -> Result<(), VoiceError> {
        if self.connections.remove(&guild_id).is_some() {
            debug!(guild = %guild_id, "Left voice channel");
        }
        Ok(())
    }

    async fn listeners(&self, guild_id: GuildId) -> Result<Vec<UserId>, VoiceError> {
        Ok(self
            .listeners
            .get(&guild_id)
            .map(|members| members.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild() -> GuildId {
        GuildId::new(1).unwrap()
    }

    fn track() -> Track {
        Track::from_url("A", "https://example.com/a").unwrap()
    }

    #[tokio::test]
    async fn test_play_requires_connection() {
        let voice = SimulatedVoiceTransport::new();
        let err = voice.play(guild(), &track()).await.unwrap_err();
        assert_eq!(err, VoiceError::NotConnected(guild()));

        voice.join(guild(), ChannelId::new(5).unwrap()).await.unwrap();
        voice.play(guild(), &track()).await.unwrap();
        assert_eq!(voice.now_playing(guild()).map(|t| t.title().to_string()), Some("A".into()));

        voice.pause(guild()).await.unwrap();
        assert!(voice.connection(guild()).unwrap().paused);

        voice.stop(guild()).await.unwrap();
        assert!(voice.now_playing(guild()).is_none());

        voice.leave(guild()).await.unwrap();
        assert!(voice.connection(guild()).is_none());
        // Stopping or leaving twice is harmless
        voice.stop(guild()).await.unwrap();
        voice.leave(guild()).await.unwrap();
    }

    #[tokio::test]
    async fn test_listeners() {
        let voice = SimulatedVoiceTransport::new();
        assert!(voice.listeners(guild()).await.unwrap().is_empty());

        let alice = UserId::new(10).unwrap();
        voice.add_listener(guild(), alice);
        voice.add_listener(guild(), alice);
        voice.add_listener(guild(), UserId::new(11).unwrap());
        assert_eq!(voice.listeners(guild()).await.unwrap().len(), 2);

        assert!(voice.remove_listener(guild(), alice));
        assert!(!voice.remove_listener(guild(), alice));
        assert_eq!(voice.listeners(guild()).await.unwrap().len(), 1);
    }
}
