//! Logging configuration from TOML (`[logging]` section)

use jukebox_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Raw logging configuration from TOML
///
/// # Example
///
/// ```toml
/// [logging]
/// level = "info"
/// event_log = "~/.local/share/guild-jukebox/events.jsonl"
/// file = "~/.local/share/guild-jukebox/jukebox.log"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Base level when no `-v` flag is given
    pub level: String,
    /// JSONL file receiving every session event
    pub event_log: Option<PathBuf>,
    /// Plain-text copy of the tracing output
    pub file: Option<PathBuf>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            event_log: None,
            file: None,
        }
    }
}

impl FileLoggingConfig {
    pub fn parse_level(&self) -> (String, Vec<ConfigIssue>) {
        let level = self.level.to_lowercase();
        if LEVELS.contains(&level.as_str()) {
            return (level, vec![]);
        }
        let issue = ConfigIssue::warning(
            ConfigIssueCode::UnknownLogLevel,
            format!(
                "logging.level: unknown value '{}', falling back to 'warn'",
                self.level
            ),
        );
        ("warn".to_string(), vec![issue])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_is_case_insensitive() {
        let file = FileLoggingConfig {
            level: "DEBUG".to_string(),
            ..Default::default()
        };
        let (level, issues) = file.parse_level();
        assert_eq!(level, "debug");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unknown_level_warns() {
        let file = FileLoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        let (level, issues) = file.parse_level();
        assert_eq!(level, "warn");
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownLogLevel);
    }
}
