//! JSONL file writer for session events.
//!
//! Each [`SessionEvent`] is serialized as a single JSON line carrying its
//! `type`, `guild_id` and `occurred_at`, appended via a buffered writer.

use jukebox_application::EventPublisher;
use jukebox_domain::SessionEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL event logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLogger {
    /// Create a logger appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventPublisher for JsonlEventLogger {
    fn publish(&self, event: &SessionEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(event = event.name(), error = %e, "Could not serialize event");
                return;
            }
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // JSONL is append-only; flush each record
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebox_domain::{GuildId, SessionEventKind, TrackId, UserId, VoteStatus, VoteType};

    fn guild() -> GuildId {
        GuildId::new(42).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_logger_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger.publish(&SessionEvent::new(
            guild(),
            SessionEventKind::TrackFinished {
                track_id: TrackId::new("abc").unwrap(),
                title: "Song".to_string(),
                skipped: true,
            },
        ));
        logger.publish(&SessionEvent::new(
            guild(),
            SessionEventKind::VoteResolved {
                vote_type: VoteType::Skip,
                status: VoteStatus::Approved,
                approvals: 3,
            },
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line["guild_id"], 42);
            assert!(line.get("occurred_at").is_some());
        }

        assert_eq!(lines[0]["type"], "track_finished");
        assert_eq!(lines[0]["title"], "Song");
        assert_eq!(lines[0]["skipped"], true);
        assert_eq!(lines[1]["type"], "vote_resolved");
        assert_eq!(lines[1]["vote_type"], "skip");
    }

    #[test]
    fn test_jsonl_logger_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        for _ in 0..2 {
            let logger = JsonlEventLogger::new(&path).unwrap();
            logger.publish(&SessionEvent::new(
                guild(),
                SessionEventKind::VoteStarted {
                    vote_type: VoteType::Stop,
                    initiator: UserId::new(7).unwrap(),
                    required: 2,
                },
            ));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_jsonl_logger_returns_none_for_directory_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlEventLogger::new(dir.path()).is_none());
    }
}
