//! Command script parsing
//!
//! One command per line; `#` starts a comment. Queue positions are 1-based
//! here, as users see them, and converted to 0-based indexes on parse.

use jukebox_domain::{LoopMode, VoteChoice, VoteType};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Switch the guild later commands apply to
    Guild(u64),
    /// User enters the voice channel
    Join { user: u64 },
    /// User leaves the voice channel
    Part { user: u64 },
    Play { user: u64, query: String, next: bool },
    Pause,
    Resume,
    Stop { clear: bool, disconnect: bool },
    Skip { user: u64, force: bool },
    Vote {
        vote_type: VoteType,
        user: u64,
        choice: VoteChoice,
    },
    Remove { index: usize },
    Clear,
    Shuffle,
    Move { from: usize, to: usize },
    /// `None` cycles to the next mode
    Loop(Option<LoopMode>),
    Volume { percent: u8 },
    /// The current stream ended, optionally with an error
    Finish { error: Option<String> },
    Queue,
    Now,
    /// Run the reaper as if `after_secs` had passed
    Sweep { after_secs: u64 },
}

impl Command {
    /// Parse one line; blank lines and comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = strip_comment(line).trim();
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match verb.to_lowercase().as_str() {
            "guild" => Command::Guild(id(arg(&rest, 0, "guild id")?)?),
            "join" => Command::Join {
                user: id(arg(&rest, 0, "user id")?)?,
            },
            "part" => Command::Part {
                user: id(arg(&rest, 0, "user id")?)?,
            },
            "play" | "playnext" => {
                let user = id(arg(&rest, 0, "user id")?)?;
                let query = rest.get(1..).unwrap_or_default().join(" ");
                if query.is_empty() {
                    return Err(format!("{}: missing query", verb));
                }
                Command::Play {
                    user,
                    query,
                    next: verb.eq_ignore_ascii_case("playnext"),
                }
            }
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "stop" => Command::Stop {
                clear: rest.contains(&"clear"),
                disconnect: rest.contains(&"disconnect"),
            },
            "skip" => Command::Skip {
                user: id(arg(&rest, 0, "user id")?)?,
                force: rest.get(1) == Some(&"force"),
            },
            "vote" => Command::Vote {
                vote_type: arg(&rest, 0, "vote type")?.parse()?,
                user: id(arg(&rest, 1, "user id")?)?,
                choice: arg(&rest, 2, "choice")?.parse()?,
            },
            "remove" => Command::Remove {
                index: position(arg(&rest, 0, "position")?)?,
            },
            "clear" => Command::Clear,
            "shuffle" => Command::Shuffle,
            "move" => Command::Move {
                from: position(arg(&rest, 0, "from position")?)?,
                to: position(arg(&rest, 1, "to position")?)?,
            },
            "loop" => Command::Loop(match rest.first() {
                Some(mode) => Some(mode.parse()?),
                None => None,
            }),
            "volume" => Command::Volume {
                percent: arg(&rest, 0, "percent")?
                    .parse()
                    .map_err(|_| "volume: expected 0-100".to_string())?,
            },
            "finish" => Command::Finish {
                error: match rest.first() {
                    Some(&"error") => Some(rest.get(1..).unwrap_or_default().join(" ")),
                    _ => None,
                },
            },
            "queue" => Command::Queue,
            "now" => Command::Now,
            "sweep" => Command::Sweep {
                after_secs: match rest.first() {
                    Some(secs) => secs
                        .parse()
                        .map_err(|_| format!("sweep: invalid seconds '{}'", secs))?,
                    None => 0,
                },
            },
            other => return Err(format!("unknown command '{}'", other)),
        };
        Ok(Some(command))
    }
}

/// Parse a whole script, reporting the first bad line
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>, ScriptError> {
    let mut commands = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        match Command::parse(line) {
            Ok(Some(command)) => commands.push((line_number, command)),
            Ok(None) => {}
            Err(message) => {
                return Err(ScriptError {
                    line: line_number,
                    message,
                });
            }
        }
    }
    Ok(commands)
}

/// `#` opens a comment only at the start of a line or after whitespace,
/// so URL fragments survive
fn strip_comment(line: &str) -> &str {
    let mut after_space = true;
    for (index, c) in line.char_indices() {
        if c == '#' && after_space {
            return &line[..index];
        }
        after_space = c.is_whitespace();
    }
    line
}

fn arg<'a>(rest: &[&'a str], index: usize, name: &str) -> Result<&'a str, String> {
    rest.get(index)
        .copied()
        .ok_or_else(|| format!("missing {}", name))
}

fn id(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(format!("invalid id '{}'", value)),
        Ok(id) => Ok(id),
    }
}

/// 1-based position to 0-based index
fn position(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .ok()
        .and_then(|p| p.checked_sub(1))
        .ok_or_else(|| format!("invalid position '{}' (positions start at 1)", value))
}
