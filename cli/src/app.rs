//! Composition of the use cases behind the command script
//!
//! [`Jukebox`] owns one instance of every use case, all sharing a single
//! [`SessionStore`], and maps script [`Command`]s onto them.

use crate::output::ConsoleFormatter;
use crate::script::Command;
use anyhow::{Context, Result};
use chrono::Utc;
use jukebox_application::{
    AudioResolver, CastVoteInput, EndReason, GetCurrentTrackQuery, GetQueueQuery,
    PlayTrackInput, PlayTrackUseCase, PlaybackControlUseCase, QueueManagementUseCase,
    SessionReaper, SessionStore, SkipInput, StopInput, TrackEndSignal, TrackEndUseCase,
    VoteUseCase, VoiceTransport,
};
use jukebox_domain::{ChannelId, GuildId, UserId, Volume, VotingDomainService};
use jukebox_infrastructure::SimulatedVoiceTransport;
use std::sync::Arc;
use tracing::debug;

pub struct Jukebox {
    guild_id: GuildId,
    voice: Arc<SimulatedVoiceTransport>,
    play: PlayTrackUseCase,
    control: PlaybackControlUseCase,
    queue: QueueManagementUseCase,
    votes: VoteUseCase,
    track_end: TrackEndUseCase,
    get_queue: GetQueueQuery,
    get_current: GetCurrentTrackQuery,
    reaper: Arc<SessionReaper>,
}

impl Jukebox {
    pub fn new(
        guild_id: GuildId,
        store: SessionStore,
        resolver: Arc<dyn AudioResolver>,
        voice: Arc<SimulatedVoiceTransport>,
        voting: VotingDomainService,
    ) -> Self {
        let transport: Arc<dyn VoiceTransport> = voice.clone();
        Self {
            guild_id,
            play: PlayTrackUseCase::new(store.clone(), resolver, transport.clone()),
            control: PlaybackControlUseCase::new(
                store.clone(),
                transport.clone(),
                voting.clone(),
            ),
            queue: QueueManagementUseCase::new(store.clone()),
            votes: VoteUseCase::new(store.clone(), transport.clone(), voting.clone()),
            track_end: TrackEndUseCase::new(store.clone(), transport.clone()),
            get_queue: GetQueueQuery::new(store.clone()),
            get_current: GetCurrentTrackQuery::new(store.clone()),
            reaper: Arc::new(SessionReaper::new(store, transport, voting)),
            voice,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn reaper(&self) -> Arc<SessionReaper> {
        Arc::clone(&self.reaper)
    }

    /// Run one command and describe the result
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        debug!(guild = %self.guild_id, command = ?command, "Executing");
        let guild_id = self.guild_id;

        let message = match command {
            Command::Guild(id) => {
                self.guild_id = GuildId::new(id)?;
                format!("Switched to guild {}", self.guild_id)
            }
            Command::Join { user } => {
                self.voice.add_listener(guild_id, UserId::new(user)?);
                format!("User {} joined the voice channel", user)
            }
            Command::Part { user } => {
                let user_id = UserId::new(user)?;
                self.voice.remove_listener(guild_id, user_id);
                let left = format!("User {} left the voice channel", user);
                match self.control.requester_left(guild_id, user_id).await? {
                    Some(output) => format!("{}. {}", left, ConsoleFormatter::skipped(&output)),
                    None => left,
                }
            }
            Command::Play { user, query, next } => {
                let user_id = UserId::new(user)?;
                let input = PlayTrackInput::new(
                    guild_id,
                    self.channel_of(user_id).await?,
                    user_id,
                    format!("user{}", user),
                    query,
                )
                .with_play_next(next);
                ConsoleFormatter::played(&self.play.execute(input).await?)
            }
            Command::Pause => {
                self.control.pause(guild_id).await?;
                "Paused".to_string()
            }
            Command::Resume => {
                self.control.resume(guild_id).await?;
                "Resumed".to_string()
            }
            Command::Stop { clear, disconnect } => {
                let cleared = self
                    .control
                    .stop(StopInput {
                        guild_id,
                        clear_queue: clear,
                        disconnect,
                    })
                    .await?;
                match (disconnect, cleared) {
                    (true, _) => "Stopped and disconnected".to_string(),
                    (false, 0) => "Stopped".to_string(),
                    (false, n) => format!("Stopped, {} queued track(s) dropped", n),
                }
            }
            Command::Skip { user, force } => {
                let output = self
                    .control
                    .skip(SkipInput {
                        guild_id,
                        user_id: UserId::new(user)?,
                        force,
                    })
                    .await?;
                ConsoleFormatter::skipped(&output)
            }
            Command::Vote {
                vote_type,
                user,
                choice,
            } => {
                let outcome = self
                    .votes
                    .cast(CastVoteInput {
                        guild_id,
                        vote_type,
                        voter: UserId::new(user)?,
                        choice,
                    })
                    .await?;
                ConsoleFormatter::vote(&outcome)
            }
            Command::Remove { index } => {
                let removed = self.queue.remove_at(guild_id, index).await?;
                format!("Removed {}", removed.title())
            }
            Command::Clear => {
                let count = self.queue.clear(guild_id).await?;
                format!("Cleared {} track(s)", count)
            }
            Command::Shuffle => {
                let count = self.queue.shuffle(guild_id).await?;
                format!("Shuffled {} track(s)", count)
            }
            Command::Move { from, to } => {
                self.queue.move_track(guild_id, from, to).await?;
                format!("Moved #{} to #{}", from + 1, to + 1)
            }
            Command::Loop(mode) => {
                let mode = match mode {
                    Some(mode) => {
                        self.control.set_loop_mode(guild_id, mode).await?;
                        mode
                    }
                    None => self.control.toggle_loop(guild_id).await?,
                };
                format!("Loop: {}", mode)
            }
            Command::Volume { percent } => {
                let volume = Volume::new(f32::from(percent) / 100.0)?;
                self.control.set_volume(guild_id, volume).await?;
                format!("Volume: {}%", volume.as_percent())
            }
            Command::Finish { error } => {
                let track = self
                    .voice
                    .now_playing(guild_id)
                    .context("Nothing is streaming")?;
                let reason = match error {
                    Some(message) => EndReason::Error(message),
                    None => EndReason::Finished,
                };
                let outcome = self
                    .track_end
                    .execute(TrackEndSignal {
                        guild_id,
                        track_id: track.id().clone(),
                        reason,
                    })
                    .await?;
                ConsoleFormatter::track_end(&outcome)
            }
            Command::Queue => ConsoleFormatter::queue(&self.get_queue.execute(guild_id).await?),
            Command::Now => {
                let now = self.get_current.execute(guild_id).await?;
                ConsoleFormatter::now_playing(now.as_ref())
            }
            Command::Sweep { after_secs } => {
                let at = Utc::now() + chrono::Duration::seconds(after_secs as i64);
                ConsoleFormatter::reaped(&self.reaper.sweep_once(at).await?)
            }
        };
        Ok(message)
    }

    /// The guild's voice channel if `user_id` is in it
    async fn channel_of(&self, user_id: UserId) -> Result<Option<ChannelId>> {
        let listeners = self.voice.listeners(self.guild_id).await?;
        if !listeners.contains(&user_id) {
            return Ok(None);
        }
        // One simulated voice channel per guild, numbered like the guild
        Ok(Some(ChannelId::new(self.guild_id.get())?))
    }
}
