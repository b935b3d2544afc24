//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Free-form fields stay strings here and are parsed into domain types by
//! the `parse_*` / `to_*` methods, which report problems as [`ConfigIssue`]s
//! instead of failing the whole load.

mod logging;
mod playback;
mod voting;

pub use logging::FileLoggingConfig;
pub use playback::FilePlaybackConfig;
pub use voting::FileVotingConfig;

use jukebox_application::{PlaybackConfig, VotingConfig};
use jukebox_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Queue limits and session lifetime
    pub playback: FilePlaybackConfig,
    /// Vote thresholds and expiry
    pub voting: FileVotingConfig,
    /// Log level and log files
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.playback.to_playback_config().1);
        issues.extend(self.voting.to_voting_config().1);
        issues.extend(self.logging.parse_level().1);
        issues
    }

    pub fn to_playback_config(&self) -> PlaybackConfig {
        self.playback.to_playback_config().0
    }

    pub fn to_voting_config(&self) -> VotingConfig {
        self.voting.to_voting_config().0
    }
}
