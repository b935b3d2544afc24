//! Vote entities
//!
//! A [`VoteSession`] tracks the ballots for one action in one guild.
//! [`ActiveVotes`] holds the guild's votes, at most one per [`VoteType`].

use crate::core::error::{DomainError, ValidationError};
use crate::core::ids::{GuildId, UserId};
use crate::events::{SessionEvent, SessionEventKind};
use crate::music::track::TrackId;
use crate::voting::value_objects::{VoteChoice, VoteStatus, VoteType};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// One voter's ballot
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub voter: UserId,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

/// Ballots for one action
#[derive(Debug, Clone)]
pub struct VoteSession {
    guild_id: GuildId,
    vote_type: VoteType,
    initiator: UserId,
    /// Track the vote is about, if any
    track_id: Option<TrackId>,
    /// Eligible voters when the vote opened
    eligible_count: usize,
    required: usize,
    votes: HashMap<UserId, Vote>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: VoteStatus,
    resolution_claimed: bool,
    pending_events: Vec<SessionEvent>,
}

impl VoteSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guild_id: GuildId,
        vote_type: VoteType,
        initiator: UserId,
        track_id: Option<TrackId>,
        eligible_count: usize,
        required: usize,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if required < 1 {
            return Err(ValidationError::InvalidThreshold.into());
        }

        Ok(Self {
            guild_id,
            vote_type,
            initiator,
            track_id,
            eligible_count,
            required,
            votes: HashMap::new(),
            created_at,
            expires_at,
            status: VoteStatus::Open,
            resolution_claimed: false,
            pending_events: Vec::new(),
        })
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    pub fn initiator(&self) -> UserId {
        self.initiator
    }

    pub fn track_id(&self) -> Option<&TrackId> {
        self.track_id.as_ref()
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible_count
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn status(&self) -> VoteStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == VoteStatus::Open
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn approvals(&self) -> usize {
        self.votes.values().filter(|v| v.choice.is_approve()).count()
    }

    pub fn denials(&self) -> usize {
        self.votes.len() - self.approvals()
    }

    /// Distinct voters who cast a ballot
    pub fn votes_cast(&self) -> usize {
        self.votes.len()
    }

    pub fn votes_needed(&self) -> usize {
        self.required.saturating_sub(self.approvals())
    }

    pub fn has_voted(&self, voter: UserId) -> bool {
        self.votes.contains_key(&voter)
    }

    pub fn choice_of(&self, voter: UserId) -> Option<VoteChoice> {
        self.votes.get(&voter).map(|v| v.choice)
    }

    pub fn is_resolution_claimed(&self) -> bool {
        self.resolution_claimed
    }

    /// "2/3 votes"
    pub fn progress(&self) -> String {
        format!("{}/{} votes", self.approvals(), self.required)
    }

    /// Record or replace a voter's ballot, returning the previous choice
    pub(crate) fn upsert(&mut self, vote: Vote) -> Option<VoteChoice> {
        self.votes.insert(vote.voter, vote).map(|prev| prev.choice)
    }

    pub(crate) fn resolve(&mut self, status: VoteStatus) {
        self.status = status;
        self.raise(SessionEventKind::VoteResolved {
            vote_type: self.vote_type,
            status,
            approvals: self.approvals(),
        });
    }

    /// True exactly once, for the first caller
    pub(crate) fn claim_resolution(&mut self) -> bool {
        !std::mem::replace(&mut self.resolution_claimed, true)
    }

    pub(crate) fn raise(&mut self, kind: SessionEventKind) {
        self.pending_events
            .push(SessionEvent::new(self.guild_id, kind));
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

/// A guild's votes, at most one per vote type
#[derive(Debug, Clone, Default)]
pub struct ActiveVotes {
    votes: BTreeMap<VoteType, VoteSession>,
    /// Events of votes that were replaced or dropped before being drained
    orphaned_events: Vec<SessionEvent>,
}

impl ActiveVotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vote_type: VoteType) -> Option<&VoteSession> {
        self.votes.get(&vote_type)
    }

    pub fn get_mut(&mut self, vote_type: VoteType) -> Option<&mut VoteSession> {
        self.votes.get_mut(&vote_type)
    }

    /// Install a vote, replacing any previous vote of the same type
    pub fn insert(&mut self, vote: VoteSession) -> Option<VoteSession> {
        let mut replaced = self.votes.insert(vote.vote_type(), vote);
        if let Some(old) = replaced.as_mut() {
            self.orphaned_events.extend(old.take_events());
        }
        replaced
    }

    pub fn remove(&mut self, vote_type: VoteType) -> Option<VoteSession> {
        let mut removed = self.votes.remove(&vote_type);
        if let Some(old) = removed.as_mut() {
            self.orphaned_events.extend(old.take_events());
        }
        removed
    }

    /// Drop every vote that no longer accepts ballots
    pub fn retain_open(&mut self) -> usize {
        let before = self.votes.len();
        let closed: Vec<VoteType> = self
            .votes
            .iter()
            .filter(|(_, v)| !v.is_open())
            .map(|(t, _)| *t)
            .collect();
        for vote_type in closed {
            self.remove(vote_type);
        }
        before - self.votes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoteSession> {
        self.votes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VoteSession> {
        self.votes.values_mut()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Drain vote events; orphaned events first, then per vote type
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        let mut events = std::mem::take(&mut self.orphaned_events);
        for vote in self.votes.values_mut() {
            events.extend(vote.take_events());
        }
        events
    }
}
