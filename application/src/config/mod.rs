//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`PlaybackConfig`]: queue limits and session lifetime
//! - [`VotingConfig`]: how votes pass and expire

pub mod playback_config;
pub mod voting_config;

pub use playback_config::PlaybackConfig;
pub use voting_config::VotingConfig;
