//! Session event sinks.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer, and
//! [`TracingEventPublisher`]; both implement the
//! [`EventPublisher`](jukebox_application::EventPublisher) port.

mod jsonl_logger;
mod tracing_publisher;

pub use jsonl_logger::JsonlEventLogger;
pub use tracing_publisher::TracingEventPublisher;
