//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.
//! The session repository port lives in the domain crate.

pub mod audio_resolver;
pub mod event_publisher;
pub mod voice_transport;
