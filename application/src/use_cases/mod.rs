//! Use cases
//!
//! Application-level operations that orchestrate domain logic. Commands run
//! through [`shared::SessionStore`]; queries only read.

pub mod play_track;
pub mod playback_control;
pub mod queries;
pub mod queue_management;
pub mod reaper;
pub mod shared;
pub mod track_end;
pub mod vote;
