//! Track end use case
//!
//! Entry point for completion signals from the voice transport. Signals can
//! arrive late: a track that was skipped a moment ago may still report its
//! end, so a signal is only acted on while its track is current.

use crate::ports::voice_transport::VoiceTransport;
use crate::use_cases::shared::{CommandError, SessionStore};
use jukebox_domain::{GuildId, PlaybackState, Track, TrackId, VoteType};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why the stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    Finished,
    /// Stopped by us (skip / stop); the command already advanced the session
    Interrupted,
    Error(String),
}

/// Completion signal for one track
#[derive(Debug, Clone)]
pub struct TrackEndSignal {
    pub guild_id: GuildId,
    pub track_id: TrackId,
    pub reason: EndReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackEndOutcome {
    Ignored,
    Advanced { next: Option<Track> },
}

pub struct TrackEndUseCase {
    store: SessionStore,
    voice: Arc<dyn VoiceTransport>,
}

impl TrackEndUseCase {
    pub fn new(store: SessionStore, voice: Arc<dyn VoiceTransport>) -> Self {
        Self { store, voice }
    }

    pub async fn execute(&self, signal: TrackEndSignal) -> Result<TrackEndOutcome, CommandError> {
        let guild_id = signal.guild_id;
        if signal.reason == EndReason::Interrupted {
            debug!(guild = %guild_id, track = %signal.track_id, "Interrupted stream, ignoring");
            return Ok(TrackEndOutcome::Ignored);
        }

        let mut guard = self.store.lock(guild_id).await;
        let Some(session) = guard.load().await? else {
            debug!(guild = %guild_id, "Track end for a guild without a session");
            return Ok(TrackEndOutcome::Ignored);
        };

        let is_current = session
            .current_track()
            .is_some_and(|current| current.id() == &signal.track_id);
        if !is_current || session.state() == PlaybackState::Stopped {
            debug!(guild = %guild_id, track = %signal.track_id, "Stale track end signal");
            return Ok(TrackEndOutcome::Ignored);
        }

        if let EndReason::Error(message) = &signal.reason {
            warn!(guild = %guild_id, track = %signal.track_id, error = %message, "Stream failed");
        }

        let next = session.advance(false)?;
        guard.votes().remove(VoteType::Skip);
        guard.save().await?;

        let voice_result = match &next {
            Some(track) => {
                info!(guild = %guild_id, track = %track.title(), "Playing next");
                self.voice.play(guild_id, track).await
            }
            None => {
                info!(guild = %guild_id, "Queue finished");
                Ok(())
            }
        };
        let voice_result = guard.settle_start(voice_result).await;
        guard.publish_pending();
        voice_result?;

        Ok(TrackEndOutcome::Advanced { next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::registry::SessionRegistry;
    use crate::use_cases::shared::test_support::*;
    use jukebox_domain::{GuildPlaybackSession, LoopMode, SessionRepository};

    struct Fixture {
        use_case: TrackEndUseCase,
        store: SessionStore,
        voice: Arc<MockVoice>,
        events: Arc<RecordingPublisher>,
    }

    /// Guild 1 playing A with B queued
    async fn fixture() -> Fixture {
        let repository = Arc::new(MockRepository::default());
        let mut session = GuildPlaybackSession::new(guild(1));
        session.enqueue(track("A")).unwrap();
        session.enqueue(track("B")).unwrap();
        session.start_next().unwrap();
        repository.save(&mut session).await.unwrap();

        let voice = Arc::new(MockVoice::default());
        let events = Arc::new(RecordingPublisher::default());
        let store = SessionStore::new(
            Arc::new(SessionRegistry::new()),
            repository,
            events.clone(),
            PlaybackConfig::default(),
        );
        Fixture {
            use_case: TrackEndUseCase::new(store.clone(), voice.clone()),
            store,
            voice,
            events,
        }
    }

    fn signal(name: &str, reason: EndReason) -> TrackEndSignal {
        TrackEndSignal {
            guild_id: guild(1),
            track_id: track(name).id().clone(),
            reason,
        }
    }

    #[tokio::test]
    async fn test_finished_track_advances() {
        let f = fixture().await;
        let outcome = f
            .use_case
            .execute(signal("A", EndReason::Finished))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            TrackEndOutcome::Advanced { next: Some(ref t) } if t.title() == "B"
        ));
        assert_eq!(f.voice.calls(), vec!["play:B"]);
        assert_eq!(f.events.names(), vec!["track_finished", "track_started"]);
    }

    #[tokio::test]
    async fn test_stale_signal_is_ignored() {
        let f = fixture().await;
        f.use_case
            .execute(signal("A", EndReason::Finished))
            .await
            .unwrap();

        // A late duplicate for A must not skip B
        let outcome = f
            .use_case
            .execute(signal("A", EndReason::Finished))
            .await
            .unwrap();
        assert_eq!(outcome, TrackEndOutcome::Ignored);
        assert_eq!(f.voice.calls(), vec!["play:B"]);
    }

    #[tokio::test]
    async fn test_interrupted_signal_is_ignored() {
        let f = fixture().await;
        let outcome = f
            .use_case
            .execute(signal("A", EndReason::Interrupted))
            .await
            .unwrap();
        assert_eq!(outcome, TrackEndOutcome::Ignored);
        assert!(f.events.names().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_guild_is_ignored() {
        let f = fixture().await;
        let mut stray = signal("A", EndReason::Finished);
        stray.guild_id = guild(2);
        assert_eq!(
            f.use_case.execute(stray).await.unwrap(),
            TrackEndOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_last_track_goes_idle() {
        let f = fixture().await;
        f.use_case
            .execute(signal("A", EndReason::Finished))
            .await
            .unwrap();
        let outcome = f
            .use_case
            .execute(signal("B", EndReason::Error("decoder".into())))
            .await
            .unwrap();

        assert_eq!(outcome, TrackEndOutcome::Advanced { next: None });
        let mut guard = f.store.lock(guild(1)).await;
        assert_eq!(guard.session().await.unwrap().state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_next_stream_failing_leaves_session_idle() {
        let f = fixture().await;
        f.voice.set_failing_play(true);

        let err = f
            .use_case
            .execute(signal("A", EndReason::Finished))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VOICE_ERROR");
        assert_eq!(
            f.events.names(),
            vec!["track_finished", "track_started", "playback_failed"]
        );

        let mut guard = f.store.lock(guild(1)).await;
        let session = guard.session().await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current_track().is_none());
    }

    #[tokio::test]
    async fn test_track_loop_replays() {
        let f = fixture().await;
        {
            let mut guard = f.store.lock(guild(1)).await;
            guard.session().await.unwrap().set_loop_mode(LoopMode::Track);
            guard.commit().await.unwrap();
        }

        f.use_case
            .execute(signal("A", EndReason::Finished))
            .await
            .unwrap();
        assert_eq!(f.voice.calls(), vec!["play:A"]);
    }
}
