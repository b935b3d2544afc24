//! Configuration validation results
//!
//! Loaders check the merged configuration and report structured issues with
//! severity levels instead of failing on the first problem.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: works, but probably not as intended.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `voting.rule` does not parse.
    InvalidVoteRule,
    /// `voting.rejection` does not parse.
    InvalidRejectionPolicy,
    /// `playback.max_queue_size` is zero.
    ZeroQueueSize,
    /// `playback.default_volume` is outside `[0.0, 1.0]`.
    VolumeOutOfRange,
    /// `voting.ttl_secs` is zero, so every vote expires on arrival.
    ZeroVoteTtl,
    /// `playback.reaper_interval_secs` is zero.
    ZeroReaperInterval,
    /// Sessions can go stale long before the reaper looks at them.
    ReaperSlowerThanTimeout,
    /// `logging.level` is not a known level.
    UnknownLogLevel,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Whether any issue in `issues` is fatal
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
