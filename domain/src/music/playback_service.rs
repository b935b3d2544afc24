//! Playback guard predicates
//!
//! Every entry point that mutates playback consults these instead of checking
//! state ad hoc, so all callers enforce the same rules.

use crate::core::error::{BusinessRule, DomainError};
use crate::music::session::GuildPlaybackSession;
use crate::music::value_objects::PlaybackState;

/// Stateless playback rules
pub struct PlaybackDomainService;

impl PlaybackDomainService {
    /// Something to play, and not already playing
    pub fn can_start_playback(session: &GuildPlaybackSession) -> bool {
        session.has_tracks() && session.state() != PlaybackState::Playing
    }

    pub fn can_pause(session: &GuildPlaybackSession) -> bool {
        session.state() == PlaybackState::Playing
    }

    pub fn can_resume(session: &GuildPlaybackSession) -> bool {
        session.state() == PlaybackState::Paused
    }

    pub fn can_skip(session: &GuildPlaybackSession) -> bool {
        session.current_track().is_some()
    }

    /// Check `target` against the transition table
    pub fn validate_transition(
        session: &GuildPlaybackSession,
        target: PlaybackState,
    ) -> Result<(), DomainError> {
        let current = session.state();
        if !current.can_transition_to(target) {
            return Err(DomainError::rule(
                BusinessRule::StateTransition,
                format!("Cannot transition from {} to {}", current, target),
            ));
        }
        Ok(())
    }
}
