//! Voting domain service and vote result handling
//!
//! Expiry is checked lazily: every cast first asks whether the vote ran out,
//! and [`VotingDomainService::sweep_expired`] lets a periodic task do the
//! same. Both paths are idempotent, so racing them is harmless.

use crate::core::error::DomainError;
use crate::core::ids::{GuildId, UserId};
use crate::events::SessionEventKind;
use crate::music::session::GuildPlaybackSession;
use crate::music::track::{Track, TrackId};
use crate::music::value_objects::PlaybackState;
use crate::voting::entities::{ActiveVotes, Vote, VoteSession};
use crate::voting::rule::{RejectionPolicy, ThresholdPolicy};
use crate::voting::value_objects::{VoteChoice, VoteStatus, VoteType};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Result of casting one ballot
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// Counted; the vote is still open
    Recorded { approvals: usize, required: usize },
    /// This ballot carried the vote
    Approved,
    /// The vote can no longer pass (early exit only)
    Rejected,
    /// The vote was already closed; the ballot was ignored
    Closed(VoteStatus),
}

impl CastOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, CastOutcome::Approved)
    }
}

/// Voting rules for a deployment
#[derive(Debug, Clone)]
pub struct VotingDomainService {
    threshold: ThresholdPolicy,
    rejection: RejectionPolicy,
    ttl: Duration,
    small_audience_size: usize,
}

impl Default for VotingDomainService {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::default(),
            rejection: RejectionPolicy::default(),
            ttl: Self::DEFAULT_TTL,
            small_audience_size: Self::SMALL_AUDIENCE_SIZE,
        }
    }
}

impl VotingDomainService {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
    /// Listener count at or below which anyone may skip without a vote
    pub const SMALL_AUDIENCE_SIZE: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: ThresholdPolicy) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_rejection(mut self, rejection: RejectionPolicy) -> Self {
        self.rejection = rejection;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_small_audience_size(mut self, size: usize) -> Self {
        self.small_audience_size = size;
        self
    }

    pub fn threshold(&self) -> ThresholdPolicy {
        self.threshold
    }

    pub fn rejection(&self) -> RejectionPolicy {
        self.rejection
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn required_threshold(&self, eligible: usize) -> usize {
        self.threshold.required(eligible)
    }

    /// Requester of the current track, or a small enough audience
    pub fn can_auto_skip(&self, user: UserId, track: &Track, listener_count: usize) -> bool {
        track.was_requested_by(user) || listener_count <= self.small_audience_size
    }

    /// The active vote of `vote_type`, opening a fresh one when needed
    ///
    /// An existing vote is reused only while it is open, unexpired and about
    /// the same track. Otherwise it is replaced, and the replacement snapshots
    /// `eligible` as its electorate.
    #[allow(clippy::too_many_arguments)]
    pub fn open<'a>(
        &self,
        ballots: &'a mut ActiveVotes,
        guild_id: GuildId,
        vote_type: VoteType,
        initiator: UserId,
        eligible: usize,
        track_id: Option<TrackId>,
        now: DateTime<Utc>,
    ) -> Result<&'a mut VoteSession, DomainError> {
        let reusable = match ballots.get_mut(vote_type) {
            Some(existing) => {
                self.check_expiry(existing, now);
                existing.is_open() && existing.track_id() == track_id.as_ref()
            }
            None => false,
        };

        if !reusable {
            let ttl = chrono::Duration::from_std(self.ttl)
                .unwrap_or_else(|_| chrono::Duration::minutes(5));
            let required = self.required_threshold(eligible);
            let mut vote = VoteSession::new(
                guild_id,
                vote_type,
                initiator,
                track_id,
                eligible,
                required,
                now,
                now + ttl,
            )?;
            vote.raise(SessionEventKind::VoteStarted {
                vote_type,
                initiator,
                required,
            });
            ballots.insert(vote);
        }

        ballots
            .get_mut(vote_type)
            .ok_or_else(|| DomainError::not_found("VoteSession", vote_type))
    }

    /// Record `voter`'s ballot and re-evaluate the vote
    ///
    /// Re-casting replaces the voter's earlier choice, so no voter counts
    /// twice. Ballots on a closed vote leave it untouched.
    pub fn cast_vote(
        &self,
        vote: &mut VoteSession,
        voter: UserId,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> CastOutcome {
        self.check_expiry(vote, now);
        if !vote.is_open() {
            return CastOutcome::Closed(vote.status());
        }

        vote.upsert(Vote {
            voter,
            choice,
            cast_at: now,
        });
        vote.raise(SessionEventKind::VoteCast {
            vote_type: vote.vote_type(),
            voter,
            approvals: vote.approvals(),
            required: vote.required(),
        });

        if vote.approvals() >= vote.required() {
            vote.resolve(VoteStatus::Approved);
            return CastOutcome::Approved;
        }

        if self.rejection == RejectionPolicy::EarlyExit && !self.can_still_pass(vote) {
            vote.resolve(VoteStatus::Rejected);
            return CastOutcome::Rejected;
        }

        CastOutcome::Recorded {
            approvals: vote.approvals(),
            required: vote.required(),
        }
    }

    /// Open -> Expired once the TTL has passed; returns whether it expired now
    pub fn check_expiry(&self, vote: &mut VoteSession, now: DateTime<Utc>) -> bool {
        if vote.is_open() && vote.is_past_expiry(now) {
            vote.resolve(VoteStatus::Expired);
            return true;
        }
        false
    }

    /// Expire overdue votes and drop every closed one; returns how many expired
    pub fn sweep_expired(&self, ballots: &mut ActiveVotes, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for vote in ballots.iter_mut() {
            if self.check_expiry(vote, now) {
                expired += 1;
            }
        }
        ballots.retain_open();
        expired
    }

    fn can_still_pass(&self, vote: &VoteSession) -> bool {
        let outstanding = vote.eligible_count().saturating_sub(vote.votes_cast());
        vote.approvals() + outstanding >= vote.required()
    }
}

/// What applying a vote's resolution did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum VoteEffect {
    /// Not approved; nothing to apply
    NoEffect,
    /// Another caller already applied this resolution
    AlreadyApplied,
    /// The vote was about a track that is no longer current
    Stale,
    Skipped { next: Option<Track> },
    Stopped { cleared: usize },
    Cleared { count: usize },
}

/// Applies approved votes to the playback session
pub struct VoteResultHandler;

impl VoteResultHandler {
    /// Apply `vote`'s resolution, at most once per vote
    pub fn apply(
        vote: &mut VoteSession,
        session: &mut GuildPlaybackSession,
    ) -> Result<VoteEffect, DomainError> {
        if vote.status() != VoteStatus::Approved {
            return Ok(VoteEffect::NoEffect);
        }
        if vote.is_resolution_claimed() {
            return Ok(VoteEffect::AlreadyApplied);
        }

        if vote.vote_type() == VoteType::Skip && !Self::targets_current(vote, session) {
            vote.claim_resolution();
            return Ok(VoteEffect::Stale);
        }

        vote.claim_resolution();
        let effect = match vote.vote_type() {
            VoteType::Skip => VoteEffect::Skipped {
                next: session.advance(true)?,
            },
            VoteType::Stop => {
                if session.state().is_active() {
                    session.stop()?;
                }
                VoteEffect::Stopped {
                    cleared: session.clear_queue(),
                }
            }
            VoteType::Clear => VoteEffect::Cleared {
                count: session.clear_queue(),
            },
        };
        Ok(effect)
    }

    fn targets_current(vote: &VoteSession, session: &GuildPlaybackSession) -> bool {
        if session.state() == PlaybackState::Stopped {
            return false;
        }
        match (vote.track_id(), session.current_track()) {
            (Some(target), Some(current)) => target == current.id(),
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild() -> GuildId {
        GuildId::new(1).unwrap()
    }

    fn user(id: u64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn track(name: &str) -> Track {
        Track::from_url(name, format!("https://example.com/{}", name)).unwrap()
    }

    fn open_skip(
        service: &VotingDomainService,
        ballots: &mut ActiveVotes,
        eligible: usize,
        track_id: Option<TrackId>,
        now: DateTime<Utc>,
    ) {
        service
            .open(ballots, guild(), VoteType::Skip, user(1), eligible, track_id, now)
            .unwrap();
    }

    fn skip_vote(ballots: &mut ActiveVotes) -> &mut VoteSession {
        ballots.get_mut(VoteType::Skip).unwrap()
    }

    #[test]
    fn test_majority_of_five_approves_on_third_voter() {
        let service = VotingDomainService::new();
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 5, None, now);
        let vote = skip_vote(&mut ballots);
        assert_eq!(vote.required(), 3);

        assert_eq!(
            service.cast_vote(vote, user(1), VoteChoice::Approve, now),
            CastOutcome::Recorded {
                approvals: 1,
                required: 3
            }
        );
        assert_eq!(
            service.cast_vote(vote, user(2), VoteChoice::Approve, now),
            CastOutcome::Recorded {
                approvals: 2,
                required: 3
            }
        );
        assert_eq!(vote.status(), VoteStatus::Open);

        assert_eq!(
            service.cast_vote(vote, user(3), VoteChoice::Approve, now),
            CastOutcome::Approved
        );
        assert_eq!(vote.status(), VoteStatus::Approved);
    }

    #[test]
    fn test_recasting_never_double_counts() {
        let service = VotingDomainService::new();
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 5, None, now);
        let vote = skip_vote(&mut ballots);

        for _ in 0..4 {
            service.cast_vote(vote, user(2), VoteChoice::Approve, now);
        }
        assert_eq!(vote.approvals(), 1);
        assert!(vote.is_open());

        service.cast_vote(vote, user(2), VoteChoice::Deny, now);
        assert_eq!(vote.approvals(), 0);
        assert_eq!(vote.votes_cast(), 1);
    }

    #[test]
    fn test_ballot_on_closed_vote_is_ignored() {
        let service = VotingDomainService::new();
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 1, None, now);
        let vote = skip_vote(&mut ballots);

        assert!(service.cast_vote(vote, user(1), VoteChoice::Approve, now).is_approved());
        assert_eq!(
            service.cast_vote(vote, user(2), VoteChoice::Approve, now),
            CastOutcome::Closed(VoteStatus::Approved)
        );
        assert_eq!(vote.approvals(), 1);
    }

    #[test]
    fn test_expiry_is_lazy_and_idempotent() {
        let service = VotingDomainService::new().with_ttl(Duration::from_secs(60));
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 5, None, now);
        let vote = skip_vote(&mut ballots);
        vote.take_events();

        let later = now + chrono::Duration::seconds(61);
        assert_eq!(
            service.cast_vote(vote, user(2), VoteChoice::Approve, later),
            CastOutcome::Closed(VoteStatus::Expired)
        );
        assert!(!service.check_expiry(vote, later));
        assert_eq!(vote.status(), VoteStatus::Expired);
        assert_eq!(vote.approvals(), 0);

        // Exactly one resolution event despite repeated checks
        let resolved = vote
            .take_events()
            .into_iter()
            .filter(|e| e.name() == "vote_resolved")
            .count();
        assert_eq!(resolved, 1);
    }

    #[test]
    fn test_wait_for_expiry_keeps_hopeless_vote_open() {
        let service = VotingDomainService::new();
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 3, None, now);
        let vote = skip_vote(&mut ballots);

        service.cast_vote(vote, user(1), VoteChoice::Deny, now);
        service.cast_vote(vote, user(2), VoteChoice::Deny, now);
        assert!(vote.is_open());
    }

    #[test]
    fn test_early_exit_rejects_when_threshold_unreachable() {
        let service = VotingDomainService::new().with_rejection(RejectionPolicy::EarlyExit);
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 3, None, now);
        let vote = skip_vote(&mut ballots);

        // required 2 of 3: one denial still leaves room
        assert!(matches!(
            service.cast_vote(vote, user(1), VoteChoice::Deny, now),
            CastOutcome::Recorded { .. }
        ));
        assert_eq!(
            service.cast_vote(vote, user(2), VoteChoice::Deny, now),
            CastOutcome::Rejected
        );
        assert_eq!(vote.status(), VoteStatus::Rejected);
    }

    #[test]
    fn test_open_reuses_active_vote_for_same_track() {
        let service = VotingDomainService::new();
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        let a = track("A");

        open_skip(&service, &mut ballots, 5, Some(a.id().clone()), now);
        service.cast_vote(skip_vote(&mut ballots), user(2), VoteChoice::Approve, now);

        // Same track: same vote, snapshot kept
        open_skip(&service, &mut ballots, 9, Some(a.id().clone()), now);
        assert_eq!(skip_vote(&mut ballots).approvals(), 1);
        assert_eq!(skip_vote(&mut ballots).eligible_count(), 5);

        // Track changed: fresh vote
        open_skip(&service, &mut ballots, 4, Some(track("B").id().clone()), now);
        assert_eq!(skip_vote(&mut ballots).approvals(), 0);
        assert_eq!(skip_vote(&mut ballots).required(), 3);
        assert_eq!(ballots.len(), 1);
    }

    #[test]
    fn test_sweep_expired() {
        let service = VotingDomainService::new().with_ttl(Duration::from_secs(10));
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 5, None, now);
        service
            .open(&mut ballots, guild(), VoteType::Clear, user(1), 5, None, now)
            .unwrap();

        assert_eq!(service.sweep_expired(&mut ballots, now), 0);
        assert_eq!(ballots.len(), 2);

        let later = now + chrono::Duration::seconds(11);
        assert_eq!(service.sweep_expired(&mut ballots, later), 2);
        assert!(ballots.is_empty());
        assert_eq!(service.sweep_expired(&mut ballots, later), 0);
    }

    #[test]
    fn test_can_auto_skip() {
        let service = VotingDomainService::new();
        let requester = user(7);
        let t = track("A").with_requester(requester, "dj", Utc::now());

        assert!(service.can_auto_skip(requester, &t, 10));
        assert!(service.can_auto_skip(user(8), &t, 2));
        assert!(!service.can_auto_skip(user(8), &t, 3));
    }

    fn playing_session(names: &[&str]) -> GuildPlaybackSession {
        let mut session = GuildPlaybackSession::new(guild());
        for name in names {
            session.enqueue(track(name)).unwrap();
        }
        session.start_next().unwrap();
        session
    }

    #[test]
    fn test_skip_scenario_with_four_listeners() {
        let service = VotingDomainService::new();
        let mut session = playing_session(&["A", "B"]);
        session.pause().unwrap();
        session.resume().unwrap();

        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        let current = session.current_track().map(|t| t.id().clone());
        open_skip(&service, &mut ballots, 4, current, now);
        let vote = skip_vote(&mut ballots);

        service.cast_vote(vote, user(1), VoteChoice::Approve, now);
        service.cast_vote(vote, user(2), VoteChoice::Approve, now);
        assert!(vote.is_open());
        assert_eq!(
            VoteResultHandler::apply(vote, &mut session).unwrap(),
            VoteEffect::NoEffect
        );

        assert!(service.cast_vote(vote, user(3), VoteChoice::Approve, now).is_approved());
        let effect = VoteResultHandler::apply(vote, &mut session).unwrap();
        assert_eq!(effect, VoteEffect::Skipped { next: Some(track("B")) });
        assert_eq!(session.current_track().map(|t| t.title()), Some("B"));
    }

    #[test]
    fn test_resolution_applies_once() {
        let service = VotingDomainService::new();
        let mut session = playing_session(&["A", "B", "C"]);
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 1, None, now);
        let vote = skip_vote(&mut ballots);
        service.cast_vote(vote, user(1), VoteChoice::Approve, now);

        VoteResultHandler::apply(vote, &mut session).unwrap();
        assert_eq!(session.current_track().map(|t| t.title()), Some("B"));

        assert_eq!(
            VoteResultHandler::apply(vote, &mut session).unwrap(),
            VoteEffect::AlreadyApplied
        );
        assert_eq!(session.current_track().map(|t| t.title()), Some("B"));
        assert_eq!(session.queue_len(), 1);
    }

    #[test]
    fn test_skip_vote_for_previous_track_is_stale() {
        let service = VotingDomainService::new();
        let mut session = playing_session(&["A", "B", "C"]);
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        open_skip(&service, &mut ballots, 1, Some(track("A").id().clone()), now);
        session.advance(false).unwrap();

        let vote = skip_vote(&mut ballots);
        service.cast_vote(vote, user(1), VoteChoice::Approve, now);
        assert_eq!(
            VoteResultHandler::apply(vote, &mut session).unwrap(),
            VoteEffect::Stale
        );
        assert_eq!(session.current_track().map(|t| t.title()), Some("B"));
    }

    #[test]
    fn test_stop_vote_stops_and_clears() {
        let service = VotingDomainService::new();
        let mut session = playing_session(&["A", "B", "C"]);
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        let vote = service
            .open(&mut ballots, guild(), VoteType::Stop, user(1), 1, None, now)
            .unwrap();
        service.cast_vote(vote, user(1), VoteChoice::Approve, now);

        assert_eq!(
            VoteResultHandler::apply(vote, &mut session).unwrap(),
            VoteEffect::Stopped { cleared: 2 }
        );
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(!session.has_tracks());
    }

    #[test]
    fn test_clear_vote_keeps_current_track() {
        let service = VotingDomainService::new();
        let mut session = playing_session(&["A", "B", "C"]);
        let mut ballots = ActiveVotes::new();
        let now = Utc::now();
        let vote = service
            .open(&mut ballots, guild(), VoteType::Clear, user(1), 1, None, now)
            .unwrap();
        service.cast_vote(vote, user(1), VoteChoice::Approve, now);

        assert_eq!(
            VoteResultHandler::apply(vote, &mut session).unwrap(),
            VoteEffect::Cleared { count: 2 }
        );
        assert!(session.is_playing());
        assert_eq!(session.queue_len(), 0);
    }
}
