//! Session reaper
//!
//! Background sweep that expires overdue votes and tears down guilds that
//! have been idle longer than the inactivity window. Each guild is swept
//! under its own lock, one at a time, so the sweep never holds more than
//! one guild.

use crate::ports::voice_transport::VoiceTransport;
use crate::use_cases::shared::{CommandError, SessionStore};
use chrono::{DateTime, Utc};
use jukebox_domain::{GuildId, VotingDomainService};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub expired_votes: usize,
    pub reaped_sessions: usize,
}

pub struct SessionReaper {
    store: SessionStore,
    voice: Arc<dyn VoiceTransport>,
    voting: VotingDomainService,
}

impl SessionReaper {
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

    /// Sweep every known guild once
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<ReapReport, CommandError> {
        let mut guilds: BTreeSet<GuildId> = self.store.registry().guilds().into_iter().collect();
        guilds.extend(self.store.repository().list_guilds().await?);

        let mut report = ReapReport::default();
        for guild_id in guilds {
            match self.sweep_guild(guild_id, now).await {
                Ok((expired, reaped)) => {
                    report.expired_votes += expired;
                    if reaped {
                        report.reaped_sessions += 1;
                    }
                }
                Err(e) => warn!(guild = %guild_id, error = %e, "Reaper skipped guild"),
            }
        }

        if report != ReapReport::default() {
            info!(
                expired_votes = report.expired_votes,
                reaped_sessions = report.reaped_sessions,
                "Reaper sweep"
            );
        }
        Ok(report)
    }

    async fn sweep_guild(
        &self,
        guild_id: GuildId,
        now: DateTime<Utc>,
    ) -> Result<(usize, bool), CommandError> {
        let timeout = self.store.playback().inactivity_timeout;
        let mut guard = self.store.lock(guild_id).await;

        let expired = self.voting.sweep_expired(guard.votes(), now);
        guard.publish_pending();

        let (has_session, inactive) = match guard.load().await? {
            Some(session) => (true, session.is_inactive(now, timeout)),
            None => (false, false),
        };

        if inactive {
            if let Err(e) = self.voice.leave(guild_id).await {
                warn!(guild = %guild_id, error = %e, "Leaving voice failed while reaping");
            }
            guard.delete().await?;
            info!(guild = %guild_id, "Reaped inactive session");
        }

        let forget = inactive || (!has_session && guard.votes().is_empty());
        drop(guard);
        if forget {
            self.store.registry().remove_if_unused(guild_id);
        }
        Ok((expired, inactive))
    }

    /// Sweep on every tick of `period` until `cancel` fires
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(period_secs = period.as_secs(), "Reaper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Reaper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once(Utc::now()).await {
                        warn!(error = %e, "Reaper sweep failed");
                    }
                }
            }
        }
    }
}
