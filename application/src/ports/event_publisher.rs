//! Port for publishing domain events.
//!
//! Defines the [`EventPublisher`] trait that history, analytics and log
//! listeners implement. Use cases drain the aggregate's events after a command
//! and publish them while still holding the guild lock, so a listener sees one
//! guild's events in mutation order.

use jukebox_domain::SessionEvent;

/// Port for receiving domain events.
///
/// The `publish` method is synchronous and non-fallible: a failing listener
/// must not undo a command that already happened.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &SessionEvent);
}

/// No-op implementation for tests and when publishing is disabled.
pub struct NoEventPublisher;

impl EventPublisher for NoEventPublisher {
    fn publish(&self, _event: &SessionEvent) {}
}

/// Delegates every event to several publishers, in registration order.
#[derive(Default)]
pub struct CompositeEventPublisher {
    delegates: Vec<Box<dyn EventPublisher>>,
}

impl CompositeEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, publisher: impl EventPublisher + 'static) -> Self {
        self.delegates.push(Box::new(publisher));
        self
    }

    pub fn push(&mut self, publisher: Box<dyn EventPublisher>) {
        self.delegates.push(publisher);
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl EventPublisher for CompositeEventPublisher {
    fn publish(&self, event: &SessionEvent) {
        for delegate in &self.delegates {
            delegate.publish(event);
        }
    }
}
