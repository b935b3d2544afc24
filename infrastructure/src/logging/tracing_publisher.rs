//! Mirrors session events into the tracing output.

use jukebox_application::EventPublisher;
use jukebox_domain::SessionEvent;
use tracing::{debug, info};

/// Logs every event at `info`, vote bookkeeping at `debug`
#[derive(Debug, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: &SessionEvent) {
        let name = event.name();
        match name {
            "vote_cast" | "track_queued" => {
                debug!(target: "jukebox::events", guild = %event.guild_id, event = name, kind = ?event.kind)
            }
            _ => {
                info!(target: "jukebox::events", guild = %event.guild_id, event = name, kind = ?event.kind)
            }
        }
    }
}
