//! Voice transport adapters.

mod simulated;

pub use simulated::{SimulatedVoiceTransport, VoiceConnection};
