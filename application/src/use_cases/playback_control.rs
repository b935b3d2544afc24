//! Playback control use case
//!
//! Pause, resume, stop, skip, loop mode and volume for one guild. Every
//! operation runs under the guild lock and mirrors the state change to the
//! voice transport before releasing it.

use crate::ports::voice_transport::VoiceTransport;
use crate::use_cases::shared::{CommandError, GuildGuard, SessionStore};
use jukebox_domain::{
    BusinessRule, DomainError, GuildId, LoopMode, PlaybackDomainService, Track, UserId, Volume,
    VoteType, VotingDomainService,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for a stop request
#[derive(Debug, Clone, Copy)]
pub struct StopInput {
    pub guild_id: GuildId,
    /// Drop the pending queue as well
    pub clear_queue: bool,
    /// Leave the voice channel and delete the session
    pub disconnect: bool,
}

/// Input for a skip request
#[derive(Debug, Clone, Copy)]
pub struct SkipInput {
    pub guild_id: GuildId,
    pub user_id: UserId,
    /// Skip without checking requester / audience size (moderators)
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct SkipOutput {
    pub skipped: Track,
    pub next: Option<Track>,
}

pub struct PlaybackControlUseCase {
    store: SessionStore,
    voice: Arc<dyn VoiceTransport>,
    voting: VotingDomainService,
}

impl PlaybackControlUseCase {
    pub fn new(
        store: SessionStore,
        voice: Arc<dyn VoiceTransport>,
        voting: VotingDomainService,
    ) -> Self {
        Self {
            store,
            voice,
            voting,
        }
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<(), CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        guard.session().await?.pause()?;
        guard.save().await?;

        let voice_result = self.voice.pause(guild_id).await;
        guard.publish_pending();
        Ok(voice_result?)
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<(), CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        guard.session().await?.resume()?;
        guard.save().await?;

        let voice_result = self.voice.resume(guild_id).await;
        guard.publish_pending();
        Ok(voice_result?)
    }

    /// Stop playback; returns how many queued tracks were dropped
    pub async fn stop(&self, input: StopInput) -> Result<usize, CommandError> {
        let guild_id = input.guild_id;
        let mut guard = self.store.lock(guild_id).await;
        let session = guard.session().await?;

        if session.state().is_active() {
            session.stop()?;
        } else if !input.disconnect {
            return Err(DomainError::rule(
                BusinessRule::NotPlaying,
                format!("Nothing is playing (state: {})", session.state()),
            )
            .into());
        }
        let cleared = if input.clear_queue {
            session.clear_queue()
        } else {
            0
        };

        guard.save().await?;
        let voice_result = self.voice.stop(guild_id).await;
        guard.publish_pending();
        voice_result?;

        if input.disconnect {
            self.voice.leave(guild_id).await?;
            guard.delete().await?;
            info!(guild = %guild_id, "Disconnected and session removed");
        }
        Ok(cleared)
    }

    /// Skip the current track
    ///
    /// Without `force`, only the track's requester (or anyone in a small
    /// audience) may skip directly; everyone else gets
    /// [`CommandError::RequiresVote`].
    pub async fn skip(&self, input: SkipInput) -> Result<SkipOutput, CommandError> {
        let guild_id = input.guild_id;
        let listeners = if input.force {
            0
        } else {
            self.voice.listeners(guild_id).await?.len()
        };

        let mut guard = self.store.lock(guild_id).await;
        let session = guard.session().await?;

        if !PlaybackDomainService::can_skip(session) {
            return Err(DomainError::rule(BusinessRule::NothingToSkip, "Nothing to skip").into());
        }
        let skipped = match session.current_track() {
            Some(track) => track.clone(),
            None => {
                return Err(
                    DomainError::rule(BusinessRule::NothingToSkip, "Nothing to skip").into(),
                );
            }
        };
        if !input.force && !self.voting.can_auto_skip(input.user_id, &skipped, listeners) {
            return Err(CommandError::RequiresVote(VoteType::Skip));
        }

        let output = self.skip_current(&mut guard, skipped).await?;
        info!(guild = %guild_id, track = %output.skipped.title(), "Skipped");
        Ok(output)
    }

    /// A listener left the voice channel
    ///
    /// When they requested the current track it is skipped, since nobody
    /// who asked for it is left to hear it. Returns `None` when nothing
    /// changed.
    pub async fn requester_left(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<SkipOutput>, CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        let Some(session) = guard.load().await? else {
            return Ok(None);
        };
        let current = match session.current_track() {
            Some(track) if session.is_playing() || session.is_paused() => track,
            _ => return Ok(None),
        };
        if !current.was_requested_by(user_id) {
            debug!(guild = %guild_id, user = %user_id, "Departed listener did not request the current track");
            return Ok(None);
        }

        let skipped = current.clone();
        let output = self.skip_current(&mut guard, skipped).await?;
        info!(
            guild = %guild_id,
            user = %user_id,
            track = %output.skipped.title(),
            "Requester left, skipped their track"
        );
        Ok(Some(output))
    }

    /// Advance past `skipped` and start whatever comes next
    async fn skip_current(
        &self,
        guard: &mut GuildGuard,
        skipped: Track,
    ) -> Result<SkipOutput, CommandError> {
        let guild_id = guard.guild_id();
        let next = guard.session().await?.advance(true)?;
        // Any open skip vote was about the track that just left
        guard.votes().remove(VoteType::Skip);
        guard.save().await?;

        let voice_result = match &next {
            Some(track) => self.voice.play(guild_id, track).await,
            None => self.voice.stop(guild_id).await,
        };
        let voice_result = guard.settle_start(voice_result).await;
        guard.publish_pending();
        voice_result?;

        Ok(SkipOutput { skipped, next })
    }

    pub async fn set_loop_mode(&self, guild_id: GuildId, mode: LoopMode) -> Result<(), CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        guard.session().await?.set_loop_mode(mode);
        guard.commit().await
    }

    /// Cycle Off -> Track -> Queue -> Off
    pub async fn toggle_loop(&self, guild_id: GuildId) -> Result<LoopMode, CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        let mode = guard.session().await?.toggle_loop();
        guard.commit().await?;
        Ok(mode)
    }

    pub async fn set_volume(&self, guild_id: GuildId, volume: Volume) -> Result<(), CommandError> {
        let mut guard = self.store.lock(guild_id).await;
        guard.session().await?.set_volume(volume);
        guard.save().await?;

        let voice_result = self.voice.set_volume(guild_id, volume).await;
        guard.publish_pending();
        Ok(voice_result?)
    }
}
