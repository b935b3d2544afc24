//! Infrastructure layer for guild-jukebox
//!
//! This crate contains adapters that implement the ports defined
//! in the application and domain layers, including configuration file loading.

pub mod audio;
pub mod config;
pub mod logging;
pub mod persistence;
pub mod voice;

// Re-export commonly used types
pub use audio::{CatalogError, CatalogFile, CatalogResolver};
pub use config::{
    ConfigLoader, FileConfig, FileLoggingConfig, FilePlaybackConfig, FileVotingConfig,
};
pub use logging::{JsonlEventLogger, TracingEventPublisher};
pub use persistence::InMemorySessionRepository;
pub use voice::{SimulatedVoiceTransport, VoiceConnection};
