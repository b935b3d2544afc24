//! Playback configuration from TOML (`[playback]` section)

use jukebox_application::PlaybackConfig;
use jukebox_domain::{ConfigIssue, ConfigIssueCode, QueueDomainService, Volume};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw playback configuration from TOML
///
/// # Example
///
/// ```toml
/// [playback]
/// max_queue_size = 50
/// max_track_duration_secs = 10800    # 3 hours
/// default_volume = 0.5               # 0.0 - 1.0
/// inactivity_timeout_secs = 1800
/// reaper_interval_secs = 60
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlaybackConfig {
    pub max_queue_size: usize,
    pub max_track_duration_secs: u64,
    pub default_volume: f32,
    pub inactivity_timeout_secs: u64,
    pub reaper_interval_secs: u64,
}

impl Default for FilePlaybackConfig {
    fn default() -> Self {
        Self {
            max_queue_size: QueueDomainService::DEFAULT_MAX_QUEUE_SIZE,
            max_track_duration_secs: QueueDomainService::DEFAULT_MAX_TRACK_DURATION.as_secs(),
            default_volume: Volume::default().get(),
            inactivity_timeout_secs: 30 * 60,
            reaper_interval_secs: 60,
        }
    }
}

impl FilePlaybackConfig {
    /// Convert to [`PlaybackConfig`], falling back to defaults for bad values.
    pub fn to_playback_config(&self) -> (PlaybackConfig, Vec<ConfigIssue>) {
        let defaults = PlaybackConfig::default();
        let mut issues = Vec::new();

        let max_queue_size = if self.max_queue_size == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroQueueSize,
                format!(
                    "playback.max_queue_size: must be at least 1, falling back to {}",
                    defaults.max_queue_size
                ),
            ));
            defaults.max_queue_size
        } else {
            self.max_queue_size
        };

        let default_volume = match Volume::new(self.default_volume) {
            Ok(volume) => volume,
            Err(_) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::VolumeOutOfRange,
                    format!(
                        "playback.default_volume: {} is outside 0.0 - 1.0, falling back to {}",
                        self.default_volume,
                        defaults.default_volume.get()
                    ),
                ));
                defaults.default_volume
            }
        };

        let reaper_interval = if self.reaper_interval_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroReaperInterval,
                format!(
                    "playback.reaper_interval_secs: must be at least 1, falling back to {}",
                    defaults.reaper_interval.as_secs()
                ),
            ));
            defaults.reaper_interval
        } else {
            Duration::from_secs(self.reaper_interval_secs)
        };

        let inactivity_timeout = Duration::from_secs(self.inactivity_timeout_secs);
        if reaper_interval > inactivity_timeout {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ReaperSlowerThanTimeout,
                format!(
                    "playback.reaper_interval_secs ({}) is longer than inactivity_timeout_secs ({}); idle sessions will linger",
                    reaper_interval.as_secs(),
                    inactivity_timeout.as_secs()
                ),
            ));
        }

        let config = PlaybackConfig::default()
            .with_max_queue_size(max_queue_size)
            .with_max_track_duration(Duration::from_secs(self.max_track_duration_secs))
            .with_default_volume(default_volume)
            .with_inactivity_timeout(inactivity_timeout)
            .with_reaper_interval(reaper_interval);
        (config, issues)
    }
}
