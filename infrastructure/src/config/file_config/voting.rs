//! Voting configuration from TOML (`[voting]` section)

use jukebox_application::VotingConfig;
use jukebox_domain::{
    ConfigIssue, ConfigIssueCode, RejectionPolicy, ThresholdPolicy, VotingDomainService,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw voting configuration from TOML
///
/// # Example
///
/// ```toml
/// [voting]
/// rule = "majority"              # "majority", "unanimous", "atleast:N", "N%"
/// rejection = "wait_for_expiry"  # or "early_exit"
/// ttl_secs = 300
/// small_audience_size = 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVotingConfig {
    pub rule: String,
    pub rejection: String,
    pub ttl_secs: u64,
    pub small_audience_size: usize,
}

impl Default for FileVotingConfig {
    fn default() -> Self {
        Self {
            rule: "majority".to_string(),
            rejection: "wait_for_expiry".to_string(),
            ttl_secs: VotingDomainService::DEFAULT_TTL.as_secs(),
            small_audience_size: VotingDomainService::SMALL_AUDIENCE_SIZE,
        }
    }
}

impl FileVotingConfig {
    /// Parse `rule`, falling back to majority
    pub fn parse_rule(&self) -> (ThresholdPolicy, Vec<ConfigIssue>) {
        match self.rule.parse::<ThresholdPolicy>() {
            Ok(rule) => (rule, vec![]),
            Err(_) => {
                let issue = ConfigIssue::error(
                    ConfigIssueCode::InvalidVoteRule,
                    format!(
                        "voting.rule: unknown value '{}' (expected majority, unanimous, atleast:N or N%), falling back to 'majority'",
                        self.rule
                    ),
                );
                (ThresholdPolicy::default(), vec![issue])
            }
        }
    }

    pub fn parse_rejection(&self) -> (RejectionPolicy, Vec<ConfigIssue>) {
        match self.rejection.parse::<RejectionPolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidRejectionPolicy,
                    format!(
                        "voting.rejection: unknown value '{}', falling back to 'wait_for_expiry'",
                        self.rejection
                    ),
                );
                (RejectionPolicy::default(), vec![issue])
            }
        }
    }

    pub fn to_voting_config(&self) -> (VotingConfig, Vec<ConfigIssue>) {
        let (rule, mut issues) = self.parse_rule();
        let (rejection, rejection_issues) = self.parse_rejection();
        issues.extend(rejection_issues);

        let ttl = if self.ttl_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroVoteTtl,
                format!(
                    "voting.ttl_secs: must be at least 1, falling back to {}",
                    VotingDomainService::DEFAULT_TTL.as_secs()
                ),
            ));
            VotingDomainService::DEFAULT_TTL
        } else {
            Duration::from_secs(self.ttl_secs)
        };

        let config = VotingConfig::default()
            .with_rule(rule)
            .with_rejection(rejection)
            .with_ttl(ttl)
            .with_small_audience_size(self.small_audience_size);
        (config, issues)
    }
}
