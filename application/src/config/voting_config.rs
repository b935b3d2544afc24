//! Voting parameters.

use jukebox_domain::{RejectionPolicy, ThresholdPolicy, VotingDomainService};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    pub rule: ThresholdPolicy,
    pub rejection: RejectionPolicy,
    /// Lifetime of an open vote.
    pub ttl: Duration,
    /// At or below this many listeners anyone may skip without a vote.
    pub small_audience_size: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            rule: ThresholdPolicy::default(),
            rejection: RejectionPolicy::default(),
            ttl: VotingDomainService::DEFAULT_TTL,
            small_audience_size: VotingDomainService::SMALL_AUDIENCE_SIZE,
        }
    }
}

impl VotingConfig {
    pub fn with_rule(mut self, rule: ThresholdPolicy) -> Self {
        self.rule = rule;
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

    pub fn to_service(&self) -> VotingDomainService {
        VotingDomainService::new()
            .with_threshold(self.rule)
            .with_rejection(self.rejection)
            .with_ttl(self.ttl)
            .with_small_audience_size(self.small_audience_size)
    }
}
