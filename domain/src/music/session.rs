//! Guild playback session aggregate
//!
//! [`GuildPlaybackSession`] owns everything that changes while a guild listens:
//! the current track, the pending queue, the playback state, loop mode and
//! volume. Every public mutator validates first and mutates second, so a
//! returned `Err` means nothing changed.
//!
//! Exclusive access for the duration of a command is the caller's job; the
//! application layer holds one lock per guild around each command.

use crate::core::error::{BusinessRule, DomainError};
use crate::core::ids::GuildId;
use crate::events::{SessionEvent, SessionEventKind};
use crate::music::playback_service::PlaybackDomainService;
use crate::music::queue_service::QueueDomainService;
use crate::music::track::Track;
use crate::music::value_objects::{LoopMode, PlaybackState, QueuePosition, Volume};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Aggregate root for one guild's playback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildPlaybackSession {
    guild_id: GuildId,
    current_track: Option<Track>,
    queue: VecDeque<Track>,
    state: PlaybackState,
    loop_mode: LoopMode,
    volume: Volume,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    /// Optimistic concurrency version, bumped by the repository on save
    version: u64,
    max_queue_size: usize,
    #[serde(skip)]
    pending_events: Vec<SessionEvent>,
}

impl GuildPlaybackSession {
    pub fn new(guild_id: GuildId) -> Self {
        let now = Utc::now();
        Self {
            guild_id,
            current_track: None,
            queue: VecDeque::new(),
            state: PlaybackState::Idle,
            loop_mode: LoopMode::Off,
            volume: Volume::default(),
            created_at: now,
            last_activity: now,
            version: 0,
            max_queue_size: QueueDomainService::DEFAULT_MAX_QUEUE_SIZE,
            pending_events: Vec::new(),
        }
    }

    pub fn with_max_queue_size(mut self, max: usize) -> Self {
        self.max_queue_size = max.max(1);
        self
    }

    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    // ==================== Accessors ====================

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// Pending tracks in play order (the current track is not included)
    pub fn queue(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_idle(&self) -> bool {
        self.state == PlaybackState::Idle
    }

    pub fn has_tracks(&self) -> bool {
        self.current_track.is_some() || !self.queue.is_empty()
    }

    pub fn can_add_to_queue(&self) -> bool {
        QueueDomainService::can_enqueue(self.queue.len(), self.max_queue_size)
    }

    /// Same source already current or queued
    pub fn is_duplicate(&self, track: &Track) -> bool {
        self.current_track
            .iter()
            .chain(self.queue.iter())
            .any(|t| t.id() == track.id())
    }

    /// Not playing and untouched for at least `window`
    pub fn is_inactive(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.state == PlaybackState::Playing {
            return false;
        }
        let idle_for = now.signed_duration_since(self.last_activity);
        idle_for.to_std().is_ok_and(|d| d >= window)
    }

    // ==================== Lifecycle ====================

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Called by repositories after a successful save
    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Drain the events raised since the last call, in raise order
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn pending_events(&self) -> &[SessionEvent] {
        &self.pending_events
    }

    // ==================== Queue ====================

    pub fn enqueue(&mut self, track: Track) -> Result<QueuePosition, DomainError> {
        self.ensure_room()?;
        let event = queued_event(&track, self.queue.len());
        let position = QueueDomainService::enqueue(&mut self.queue, track);
        self.raise(event);
        self.touch(Utc::now());
        Ok(position)
    }

    /// Insert at the front of the queue so it plays next
    pub fn enqueue_next(&mut self, track: Track) -> Result<QueuePosition, DomainError> {
        self.ensure_room()?;
        let event = queued_event(&track, 0);
        let position = QueueDomainService::enqueue_next(&mut self.queue, track);
        self.raise(event);
        self.touch(Utc::now());
        Ok(position)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Track, DomainError> {
        let removed = QueueDomainService::remove_at(&mut self.queue, index)?;
        self.raise(SessionEventKind::TrackRemoved {
            track_id: removed.id().clone(),
            position: index,
        });
        self.touch(Utc::now());
        Ok(removed)
    }

    pub fn clear_queue(&mut self) -> usize {
        let count = QueueDomainService::clear(&mut self.queue);
        self.raise(SessionEventKind::QueueCleared { track_count: count });
        self.touch(Utc::now());
        count
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        QueueDomainService::shuffle(&mut self.queue, rng);
        self.raise(SessionEventKind::QueueShuffled {
            track_count: self.queue.len(),
        });
        self.touch(Utc::now());
    }

    pub fn move_track(&mut self, from: usize, to: usize) -> Result<(), DomainError> {
        QueueDomainService::move_track(&mut self.queue, from, to)?;
        self.touch(Utc::now());
        Ok(())
    }

    // ==================== Playback ====================

    /// Play `track` right away, ahead of the queue
    pub fn start(&mut self, track: Track) -> Result<(), DomainError> {
        if self.state == PlaybackState::Playing {
            return Err(DomainError::rule(
                BusinessRule::AlreadyPlaying,
                "Playback is already running",
            ));
        }

        if let Some(previous) = self.current_track.take() {
            self.raise(finished_event(&previous, true));
        }
        self.enter_playing()?;
        self.raise(started_event(&track));
        self.current_track = Some(track);
        self.touch(Utc::now());
        Ok(())
    }

    /// Start (or resume) playback from what the session already holds
    ///
    /// With no current track the head of the queue becomes current. A paused
    /// session resumes its current track.
    pub fn start_next(&mut self) -> Result<Track, DomainError> {
        if !PlaybackDomainService::can_start_playback(self) {
            return Err(if self.state == PlaybackState::Playing {
                DomainError::rule(BusinessRule::AlreadyPlaying, "Playback is already running")
            } else {
                DomainError::rule(BusinessRule::NothingToPlay, "Nothing to play")
            });
        }

        if self.state == PlaybackState::Paused {
            if let Some(current) = self.current_track.clone() {
                self.resume()?;
                return Ok(current);
            }
        }

        let track = match self.current_track.take() {
            Some(track) => track,
            // can_start_playback guarantees a non-empty queue here
            None => self
                .queue
                .pop_front()
                .ok_or_else(|| DomainError::rule(BusinessRule::NothingToPlay, "Nothing to play"))?,
        };

        self.enter_playing()?;
        self.raise(started_event(&track));
        self.current_track = Some(track.clone());
        self.touch(Utc::now());
        Ok(track)
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        if !PlaybackDomainService::can_pause(self) {
            return Err(DomainError::rule(
                BusinessRule::NotPlaying,
                format!("Cannot pause while {}", self.state),
            ));
        }
        self.transition(PlaybackState::Paused)?;
        self.raise(SessionEventKind::PlaybackPaused);
        self.touch(Utc::now());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), DomainError> {
        if !PlaybackDomainService::can_resume(self) {
            return Err(DomainError::rule(
                BusinessRule::NotPaused,
                format!("Cannot resume while {}", self.state),
            ));
        }
        self.transition(PlaybackState::Playing)?;
        self.raise(SessionEventKind::PlaybackResumed);
        self.touch(Utc::now());
        Ok(())
    }

    /// Stop playback and drop the current track; the queue is kept
    pub fn stop(&mut self) -> Result<(), DomainError> {
        self.transition(PlaybackState::Stopped)?;
        if let Some(track) = self.current_track.take() {
            self.raise(finished_event(&track, true));
        }
        self.raise(SessionEventKind::PlaybackStopped);
        self.touch(Utc::now());
        Ok(())
    }

    /// Move past the current track after it finished or was skipped
    ///
    /// The finished track is reinserted according to the loop mode before the
    /// next one is popped. Returns the new current track, or `None` when the
    /// queue ran dry and the session went idle.
    pub fn advance(&mut self, skipped: bool) -> Result<Option<Track>, DomainError> {
        if self.state == PlaybackState::Stopped {
            return Err(DomainError::InvalidOperation {
                operation: "advance",
                state: self.state.to_string(),
                message: "Playback was stopped".to_string(),
            });
        }

        let finished = self.current_track.take();
        let finished_id = finished.as_ref().map(|t| t.id().clone());
        if let Some(track) = finished {
            self.raise(finished_event(&track, skipped));
            QueueDomainService::apply_loop(self.loop_mode, track, &mut self.queue);
        }

        let next = match self.queue.pop_front() {
            Some(next) => {
                if self.state != PlaybackState::Playing {
                    self.transition(PlaybackState::Playing)?;
                }
                self.raise(started_event(&next));
                self.current_track = Some(next.clone());
                Some(next)
            }
            None => {
                if self.state != PlaybackState::Idle {
                    self.transition(PlaybackState::Idle)?;
                }
                self.raise(SessionEventKind::QueueExhausted {
                    last_track_id: finished_id,
                });
                None
            }
        };

        self.touch(Utc::now());
        Ok(next)
    }

    /// Drop the current track after its stream failed to start
    ///
    /// The session goes back to idle so the next play starts from the queue.
    /// Returns the dropped track, or `None` when nothing was current.
    pub fn abandon_current(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<Option<Track>, DomainError> {
        let Some(track) = self.current_track.take() else {
            return Ok(None);
        };
        if self.state != PlaybackState::Idle {
            self.transition(PlaybackState::Idle)?;
        }
        self.raise(SessionEventKind::PlaybackFailed {
            track_id: track.id().clone(),
            title: track.title().to_string(),
            reason: reason.into(),
        });
        self.touch(Utc::now());
        Ok(Some(track))
    }

    /// Back to idle with nothing queued
    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.current_track = None;
        self.queue.clear();
        self.touch(Utc::now());
    }

    // ==================== Settings ====================

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        self.raise(SessionEventKind::LoopModeChanged { mode });
        self.touch(Utc::now());
    }

    /// Cycle to the next loop mode and return it
    pub fn toggle_loop(&mut self) -> LoopMode {
        let mode = self.loop_mode.next_mode();
        self.set_loop_mode(mode);
        mode
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.raise(SessionEventKind::VolumeChanged {
            volume: volume.get(),
        });
        self.touch(Utc::now());
    }

    // ==================== Internals ====================

    fn ensure_room(&self) -> Result<(), DomainError> {
        if !self.can_add_to_queue() {
            return Err(DomainError::rule(
                BusinessRule::MaxQueueSize,
                format!("Queue is full (max {} tracks)", self.max_queue_size),
            ));
        }
        Ok(())
    }

    fn transition(&mut self, target: PlaybackState) -> Result<(), DomainError> {
        PlaybackDomainService::validate_transition(self, target)?;
        self.state = target;
        Ok(())
    }

    /// Stopped sessions pass through Idle on their way back to Playing
    fn enter_playing(&mut self) -> Result<(), DomainError> {
        if self.state == PlaybackState::Stopped {
            self.transition(PlaybackState::Idle)?;
        }
        self.transition(PlaybackState::Playing)
    }

    fn raise(&mut self, kind: SessionEventKind) {
        self.pending_events
            .push(SessionEvent::new(self.guild_id, kind));
    }
}

fn queued_event(track: &Track, position: usize) -> SessionEventKind {
    SessionEventKind::TrackQueued {
        track_id: track.id().clone(),
        title: track.title().to_string(),
        position,
        requested_by: track.requester().map(|r| r.user_id),
    }
}

fn started_event(track: &Track) -> SessionEventKind {
    SessionEventKind::TrackStarted {
        track_id: track.id().clone(),
        title: track.title().to_string(),
        url: track.webpage_url().to_string(),
        duration_secs: track.duration().map(|d| d.as_secs()),
    }
}

fn finished_event(track: &Track, skipped: bool) -> SessionEventKind {
    SessionEventKind::TrackFinished {
        track_id: track.id().clone(),
        title: track.title().to_string(),
        skipped,
    }
}
