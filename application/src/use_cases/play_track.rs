//! Play track use case
//!
//! Resolves a query, queues the result for the requester's guild, and starts
//! playback when the guild is not already playing.

use crate::ports::audio_resolver::AudioResolver;
use crate::ports::voice_transport::VoiceTransport;
use crate::use_cases::shared::{CommandError, SessionStore};
use chrono::Utc;
use jukebox_domain::{
    BusinessRule, ChannelId, DomainError, GuildId, QueueDomainService, QueuePosition, Track,
    UserId,
};
use std::sync::Arc;
use tracing::info;

/// Input for the PlayTrack use case
#[derive(Debug, Clone)]
pub struct PlayTrackInput {
    pub guild_id: GuildId,
    /// Voice channel the requester is in, if any
    pub channel_id: Option<ChannelId>,
    pub user_id: UserId,
    pub user_name: String,
    /// URL or search text
    pub query: String,
    /// Insert at the front of the queue instead of the back
    pub play_next: bool,
    /// Start playback if the guild is not playing yet
    pub start_playing: bool,
}

impl PlayTrackInput {
    pub fn new(
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
        user_id: UserId,
        user_name: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            guild_id,
            channel_id,
            user_id,
            user_name: user_name.into(),
            query: query.into(),
            play_next: false,
            start_playing: true,
        }
    }

    pub fn with_play_next(mut self, play_next: bool) -> Self {
        self.play_next = play_next;
        self
    }

    pub fn with_start_playing(mut self, start: bool) -> Self {
        self.start_playing = start;
        self
    }
}

/// Output from the PlayTrack use case
#[derive(Debug, Clone)]
pub struct PlayTrackOutput {
    pub track: Track,
    /// Where the track landed in the queue
    pub position: QueuePosition,
    /// Track that started playing as a result, if any
    pub started: Option<Track>,
}

pub struct PlayTrackUseCase {
    store: SessionStore,
    resolver: Arc<dyn AudioResolver>,
    voice: Arc<dyn VoiceTransport>,
}

impl PlayTrackUseCase {
    pub fn new(
        store: SessionStore,
        resolver: Arc<dyn AudioResolver>,
        voice: Arc<dyn VoiceTransport>,
    ) -> Self {
        Self {
            store,
            resolver,
            voice,
        }
    }

    pub async fn execute(&self, input: PlayTrackInput) -> Result<PlayTrackOutput, CommandError> {
        let channel_id = input.channel_id.ok_or(CommandError::NotInVoiceChannel)?;

        // Resolution can be slow; keep it outside the guild lock
        let resolved = self.resolver.resolve(&input.query).await?;
        let track = resolved.with_requester(input.user_id, &input.user_name, Utc::now());

        let max_duration = self.store.playback().max_track_duration;
        if !QueueDomainService::validate_track_duration(&track, max_duration) {
            return Err(DomainError::rule(
                BusinessRule::TrackTooLong,
                format!(
                    "'{}' is {} long (max {} minutes)",
                    track.title(),
                    track.duration_formatted(),
                    max_duration.as_secs() / 60
                ),
            )
            .into());
        }

        let mut guard = self.store.lock(input.guild_id).await;
        let session = guard.session_or_create().await?;

        if session.is_duplicate(&track) {
            return Err(DomainError::rule(
                BusinessRule::DuplicateTrack,
                format!("'{}' is already queued", track.title()),
            )
            .into());
        }

        let position = if input.play_next {
            session.enqueue_next(track.clone())?
        } else {
            session.enqueue(track.clone())?
        };

        let started = if input.start_playing && !session.is_playing() && !session.is_paused() {
            Some(session.start_next()?)
        } else {
            None
        };

        guard.save().await?;

        let voice_result = match &started {
            Some(now_playing) => {
                info!(guild = %input.guild_id, track = %now_playing.title(), "Starting playback");
                match self.voice.join(input.guild_id, channel_id).await {
                    Ok(()) => self.voice.play(input.guild_id, now_playing).await,
                    Err(e) => Err(e),
                }
            }
            None => Ok(()),
        };
        let voice_result = guard.settle_start(voice_result).await;
        guard.publish_pending();
        voice_result?;

        info!(
            guild = %input.guild_id,
            track = %track.title(),
            position = position.display_number(),
            "Track queued"
        );

        Ok(PlayTrackOutput {
            track,
            position,
            started,
        })
    }
}
