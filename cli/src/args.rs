//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for guild-jukebox
#[derive(Parser, Debug)]
#[command(name = "jukebox")]
#[command(author, version, about = "Per-guild music queue with democratic skip votes")]
#[command(long_about = r#"
Guild Jukebox keeps one playback session per guild: a queue, a playback state
machine and skip / stop / clear votes among the listeners.

Commands are read one per line from a script file, or from stdin when no
script is given. Lines look like:

  guild 2                  switch the guild later commands apply to
  join 7                   user 7 joins the voice channel
  play 7 clair de lune     user 7 queues a track
  vote skip 3 yes          user 3 votes to skip
  finish                   the current track ends
  queue                    show the queue

Configuration files are loaded from (in priority order):
1. JUKEBOX_* environment variables (JUKEBOX_VOTING__RULE=unanimous)
2. --config <path>       Explicit config file
3. ./jukebox.toml        Project-level config
4. ~/.config/guild-jukebox/config.toml   Global config
"#)]
pub struct Cli {
    /// Command script to replay (reads stdin when omitted)
    pub script: Option<PathBuf>,

    /// Guild the commands apply to until a `guild` line switches it
    #[arg(short, long, default_value_t = 1)]
    pub guild: u64,

    /// TOML track catalog used to resolve queries
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Stop at the first failing command
    #[arg(long)]
    pub fail_fast: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
