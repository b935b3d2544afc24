//! Configuration file loading for guild-jukebox
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `JUKEBOX_` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./jukebox.toml` or `./.jukebox.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/guild-jukebox/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{FileConfig, FileLoggingConfig, FilePlaybackConfig, FileVotingConfig};
pub use loader::ConfigLoader;
