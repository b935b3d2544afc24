//! Vote use case
//!
//! Casts a listener's ballot on a skip / stop / clear vote. The eligible
//! electorate is whoever is in the voice channel when the vote opens.

use crate::ports::voice_transport::VoiceTransport;
use crate::use_cases::shared::{CommandError, SessionStore};
use chrono::{DateTime, Utc};
use jukebox_domain::{
    ActiveVotes, BusinessRule, CastOutcome, DomainError, GuildId, GuildPlaybackSession, Track,
    UserId, VoteChoice, VoteEffect, VoteResultHandler, VoteStatus, VoteType, VotingDomainService,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for casting a ballot
#[derive(Debug, Clone, Copy)]
pub struct CastVoteInput {
    pub guild_id: GuildId,
    pub vote_type: VoteType,
    pub voter: UserId,
    pub choice: VoteChoice,
}

/// What a ballot led to
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    /// The voter could skip without a vote (requester or small audience)
    AutoSkipped { skipped: Track, next: Option<Track> },
    /// Counted; the vote is still open
    Recorded { approvals: usize, required: usize },
    /// The vote passed and its effect was applied to the session
    Applied(VoteEffect),
    /// The vote can no longer pass
    Rejected,
    /// The vote had already closed before this ballot
    Closed(VoteStatus),
}

impl VoteOutcome {
    fn changes_session(&self) -> bool {
        matches!(
            self,
            VoteOutcome::AutoSkipped { .. }
                | VoteOutcome::Applied(
                    VoteEffect::Skipped { .. }
                        | VoteEffect::Stopped { .. }
                        | VoteEffect::Cleared { .. }
                )
        )
    }
}

pub struct VoteUseCase {
    store: SessionStore,
    voice: Arc<dyn VoiceTransport>,
    voting: VotingDomainService,
}

impl VoteUseCase {
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

    pub async fn cast(&self, input: CastVoteInput) -> Result<VoteOutcome, CommandError> {
        let guild_id = input.guild_id;
        let listeners = self.voice.listeners(guild_id).await?;
        if !listeners.contains(&input.voter) {
            return Err(CommandError::NotInVoiceChannel);
        }

        let mut guard = self.store.lock(guild_id).await;
        let outcome = {
            let (session, ballots) = guard.session_and_votes().await?;
            self.apply_ballot(session, ballots, input, listeners.len(), Utc::now())?
        };

        if outcome.changes_session() {
            guard.save().await?;
        }

        let voice_result = match &outcome {
            VoteOutcome::AutoSkipped { next, .. }
            | VoteOutcome::Applied(VoteEffect::Skipped { next }) => {
                let result = match next {
                    Some(track) => self.voice.play(guild_id, track).await,
                    None => self.voice.stop(guild_id).await,
                };
                guard.settle_start(result).await
            }
            VoteOutcome::Applied(VoteEffect::Stopped { .. }) => self.voice.stop(guild_id).await,
            _ => Ok(()),
        };
        guard.publish_pending();
        voice_result?;

        debug!(
            guild = %guild_id,
            vote = %input.vote_type,
            voter = %input.voter,
            outcome = ?outcome,
            "Ballot handled"
        );
        Ok(outcome)
    }

    fn apply_ballot(
        &self,
        session: &mut GuildPlaybackSession,
        ballots: &mut ActiveVotes,
        input: CastVoteInput,
        listener_count: usize,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, CommandError> {
        let track_id = if input.vote_type == VoteType::Skip {
            let current = session
                .current_track()
                .cloned()
                .ok_or_else(|| DomainError::rule(BusinessRule::NothingToSkip, "Nothing to skip"))?;

            if input.choice.is_approve()
                && self
                    .voting
                    .can_auto_skip(input.voter, &current, listener_count)
            {
                let next = session.advance(true)?;
                ballots.remove(VoteType::Skip);
                info!(guild = %input.guild_id, track = %current.title(), "Skipped without a vote");
                return Ok(VoteOutcome::AutoSkipped {
                    skipped: current,
                    next,
                });
            }
            Some(current.id().clone())
        } else {
            None
        };

        let vote = self.voting.open(
            ballots,
            input.guild_id,
            input.vote_type,
            input.voter,
            listener_count,
            track_id,
            now,
        )?;

        let outcome = match self.voting.cast_vote(vote, input.voter, input.choice, now) {
            CastOutcome::Recorded {
                approvals,
                required,
            } => VoteOutcome::Recorded {
                approvals,
                required,
            },
            CastOutcome::Approved => {
                let effect = VoteResultHandler::apply(vote, session)?;
                info!(guild = %input.guild_id, vote = %input.vote_type, effect = ?effect, "Vote passed");
                VoteOutcome::Applied(effect)
            }
            CastOutcome::Rejected => VoteOutcome::Rejected,
            CastOutcome::Closed(status) => VoteOutcome::Closed(status),
        };

        ballots.retain_open();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::registry::SessionRegistry;
    use crate::use_cases::shared::test_support::*;
    use jukebox_domain::{PlaybackState, RejectionPolicy, SessionRepository};

    struct Fixture {
        use_case: VoteUseCase,
        store: SessionStore,
        repository: Arc<MockRepository>,
        voice: Arc<MockVoice>,
        events: Arc<RecordingPublisher>,
    }

    /// Guild 1 playing A (requested by user 9, not listening) with B queued
    async fn fixture(listeners: &[u64], voting: VotingDomainService) -> Fixture {
        let repository = Arc::new(MockRepository::default());
        let mut session = GuildPlaybackSession::new(guild(1));
        session
            .enqueue(track("A").with_requester(user(9), "dj", Utc::now()))
            .unwrap();
        session.enqueue(track("B")).unwrap();
        session.start_next().unwrap();
        repository.save(&mut session).await.unwrap();

        let voice = Arc::new(MockVoice::with_listeners(listeners));
        let events = Arc::new(RecordingPublisher::default());
        let store = SessionStore::new(
            Arc::new(SessionRegistry::new()),
            repository.clone(),
            events.clone(),
            PlaybackConfig::default(),
        );
        Fixture {
            use_case: VoteUseCase::new(store.clone(), voice.clone(), voting),
            store,
            repository,
            voice,
            events,
        }
    }

    fn ballot(vote_type: VoteType, voter: u64, choice: VoteChoice) -> CastVoteInput {
        CastVoteInput {
            guild_id: guild(1),
            vote_type,
            voter: user(voter),
            choice,
        }
    }

    async fn current_title(f: &Fixture) -> Option<String> {
        let mut guard = f.store.lock(guild(1)).await;
        guard
            .session()
            .await
            .unwrap()
            .current_track()
            .map(|t| t.title().to_string())
    }

    #[tokio::test]
    async fn test_skip_vote_of_four_passes_on_third_approval() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;

        let first = f
            .use_case
            .cast(ballot(VoteType::Skip, 1, VoteChoice::Approve))
            .await
            .unwrap();
        assert_eq!(
            first,
            VoteOutcome::Recorded {
                approvals: 1,
                required: 3
            }
        );
        let second = f
            .use_case
            .cast(ballot(VoteType::Skip, 2, VoteChoice::Approve))
            .await
            .unwrap();
        assert_eq!(
            second,
            VoteOutcome::Recorded {
                approvals: 2,
                required: 3
            }
        );
        assert!(f.voice.calls().is_empty());
        assert_eq!(current_title(&f).await.as_deref(), Some("A"));

        let third = f
            .use_case
            .cast(ballot(VoteType::Skip, 3, VoteChoice::Approve))
            .await
            .unwrap();
        assert!(matches!(
            third,
            VoteOutcome::Applied(VoteEffect::Skipped { next: Some(ref t) }) if t.title() == "B"
        ));
        assert_eq!(f.voice.calls(), vec!["play:B"]);
        assert_eq!(current_title(&f).await.as_deref(), Some("B"));

        let names = f.events.names();
        assert_eq!(names[0], "vote_started");
        let resolved = names.iter().position(|n| *n == "vote_resolved").unwrap();
        let finished = names.iter().position(|n| *n == "track_finished").unwrap();
        assert!(resolved < finished, "vote events publish first: {:?}", names);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_earlier_ballots_and_drops_its_events() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;
        for voter in 1..=2 {
            f.use_case
                .cast(ballot(VoteType::Skip, voter, VoteChoice::Approve))
                .await
                .unwrap();
        }
        let published = f.events.names();

        // Another writer moves the stored row ahead
        if let Some(row) = f.repository.rows.lock().unwrap().get_mut(&guild(1)) {
            row.bump_version();
        }
        let err = f
            .use_case
            .cast(ballot(VoteType::Skip, 3, VoteChoice::Approve))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONCURRENCY_ERROR");
        assert_eq!(f.events.names(), published);
        assert!(f.voice.calls().is_empty());
        assert_eq!(current_title(&f).await.as_deref(), Some("A"));

        // The two earlier approvals still stand, so the retry passes
        let retry = f
            .use_case
            .cast(ballot(VoteType::Skip, 3, VoteChoice::Approve))
            .await
            .unwrap();
        assert!(matches!(
            retry,
            VoteOutcome::Applied(VoteEffect::Skipped { next: Some(ref t) }) if t.title() == "B"
        ));
        let names = f.events.names();
        assert_eq!(names.iter().filter(|n| **n == "vote_resolved").count(), 1);
        assert_eq!(&names[..published.len()], &published[..]);
        assert_eq!(f.voice.calls(), vec!["play:B"]);
    }

    #[tokio::test]
    async fn test_passed_skip_with_failing_stream_goes_idle() {
        let f = fixture(&[1, 2], VotingDomainService::new()).await;
        f.voice.set_failing_play(true);

        let err = f
            .use_case
            .cast(ballot(VoteType::Skip, 1, VoteChoice::Approve))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VOICE_ERROR");

        let mut guard = f.store.lock(guild(1)).await;
        let session = guard.session().await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current_track().is_none());
    }

    #[tokio::test]
    async fn test_recasting_does_not_double_count() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;
        for _ in 0..3 {
            let outcome = f
                .use_case
                .cast(ballot(VoteType::Skip, 1, VoteChoice::Approve))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                VoteOutcome::Recorded {
                    approvals: 1,
                    required: 3
                }
            );
        }
        assert_eq!(current_title(&f).await.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_new_track_gets_a_fresh_skip_vote() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;
        for voter in 1..=3 {
            f.use_case
                .cast(ballot(VoteType::Skip, voter, VoteChoice::Approve))
                .await
                .unwrap();
        }

        let outcome = f
            .use_case
            .cast(ballot(VoteType::Skip, 1, VoteChoice::Approve))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Recorded {
                approvals: 1,
                required: 3
            }
        );
    }

    #[tokio::test]
    async fn test_voter_must_be_listening() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;
        let err = f
            .use_case
            .cast(ballot(VoteType::Skip, 42, VoteChoice::Approve))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotInVoiceChannel));
        assert!(f.events.names().is_empty());
    }

    #[tokio::test]
    async fn test_small_audience_skips_without_a_vote() {
        let f = fixture(&[1, 2], VotingDomainService::new()).await;
        let outcome = f
            .use_case
            .cast(ballot(VoteType::Skip, 1, VoteChoice::Approve))
            .await
            .unwrap();

        assert!(matches!(outcome, VoteOutcome::AutoSkipped { ref skipped, .. } if skipped.title() == "A"));
        assert_eq!(f.voice.calls(), vec!["play:B"]);
        assert!(!f.events.names().contains(&"vote_started"));
    }

    #[tokio::test]
    async fn test_stop_vote_stops_and_clears() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;
        let mut last = None;
        for voter in 1..=3 {
            last = Some(
                f.use_case
                    .cast(ballot(VoteType::Stop, voter, VoteChoice::Approve))
                    .await
                    .unwrap(),
            );
        }

        assert_eq!(
            last,
            Some(VoteOutcome::Applied(VoteEffect::Stopped { cleared: 1 }))
        );
        assert_eq!(f.voice.calls(), vec!["stop"]);

        let mut guard = f.store.lock(guild(1)).await;
        let session = guard.session().await.unwrap();
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert_eq!(session.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_early_exit_rejects_hopeless_vote() {
        let voting = VotingDomainService::new().with_rejection(RejectionPolicy::EarlyExit);
        let f = fixture(&[1, 2, 3, 4], voting).await;

        f.use_case
            .cast(ballot(VoteType::Clear, 1, VoteChoice::Deny))
            .await
            .unwrap();
        let outcome = f
            .use_case
            .cast(ballot(VoteType::Clear, 2, VoteChoice::Deny))
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::Rejected);
        assert!(f.voice.calls().is_empty());
    }

    #[tokio::test]
    async fn test_skip_vote_needs_a_current_track() {
        let f = fixture(&[1, 2, 3, 4], VotingDomainService::new()).await;
        {
            let mut guard = f.store.lock(guild(1)).await;
            guard.session().await.unwrap().stop().unwrap();
            guard.commit().await.unwrap();
        }

        let err = f
            .use_case
            .cast(ballot(VoteType::Skip, 1, VoteChoice::Approve))
            .await
            .unwrap_err();
        assert_eq!(
            err.domain().and_then(|e| e.violated_rule()),
            Some(BusinessRule::NothingToSkip)
        );
    }
}
