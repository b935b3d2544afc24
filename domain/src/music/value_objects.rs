//! Music value objects
//!
//! # State Transitions
//!
//! ```text
//! Idle ──> Playing ──> Paused
//!   ^       │  ^        │
//!   │       │  └────────┘
//!   │       v           │
//!   └──── Stopped <─────┘
//!   (Playing / Paused may also drop straight back to Idle)
//! ```

use crate::core::error::{DomainError, ValidationError};
use serde::{Deserialize, Serialize};

/// Playback state of one guild session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No current track
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    pub const ALL: [PlaybackState; 4] = [
        PlaybackState::Idle,
        PlaybackState::Playing,
        PlaybackState::Paused,
        PlaybackState::Stopped,
    ];

    /// Whether `target` is reachable from this state in one step
    pub fn can_transition_to(&self, target: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, target),
            (Idle, Playing)
                | (Playing, Paused)
                | (Playing, Stopped)
                | (Playing, Idle)
                | (Paused, Playing)
                | (Paused, Stopped)
                | (Paused, Idle)
                | (Stopped, Idle)
        )
    }

    /// Playing or paused
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn can_accept_commands(&self) -> bool {
        !matches!(self, PlaybackState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a finished track is put back into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Off,
    /// Repeat the current track
    Track,
    /// Cycle the whole queue
    Queue,
}

impl LoopMode {
    /// Off -> Track -> Queue -> Off
    pub fn next_mode(&self) -> LoopMode {
        match self {
            LoopMode::Off => LoopMode::Track,
            LoopMode::Track => LoopMode::Queue,
            LoopMode::Queue => LoopMode::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::Off => "off",
            LoopMode::Track => "track",
            LoopMode::Queue => "queue",
        }
    }
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" | "none" => Ok(LoopMode::Off),
            "track" | "single" => Ok(LoopMode::Track),
            "queue" | "all" => Ok(LoopMode::Queue),
            other => Err(format!(
                "Unknown loop mode: {}. Valid: off, track, queue",
                other
            )),
        }
    }
}

/// 0-based index into the pending queue
///
/// Only constructed through [`QueuePosition::within`], so holding one means
/// it was in range for the queue it was checked against. Do not keep it
/// across another mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QueuePosition(usize);

impl QueuePosition {
    /// Validate `index` against a queue of length `len`
    pub fn within(index: usize, len: usize) -> Result<Self, DomainError> {
        if index >= len {
            return Err(ValidationError::OutOfRange {
                position: index,
                len,
            }
            .into());
        }
        Ok(Self(index))
    }

    /// Position a newly appended track lands on
    pub(crate) fn tail_of(len_before: usize) -> Self {
        Self(len_before)
    }

    pub(crate) fn front() -> Self {
        Self(0)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// 1-based position for display
    pub fn display_number(&self) -> usize {
        self.0 + 1
    }
}

impl std::fmt::Display for QueuePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output volume in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Volume(f32);

impl Volume {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 1.0;

    pub fn new(value: f32) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::VolumeOutOfBounds(value).into());
        }
        Ok(Self(value))
    }

    /// Saturate into range instead of failing (NaN becomes the default)
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(&self) -> f32 {
        self.0
    }

    pub fn as_percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f32> for Volume {
    type Error = DomainError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Volume> for f32 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}
