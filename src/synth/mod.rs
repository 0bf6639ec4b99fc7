//! Voices, oscillators and the polyphonic synthesizer, plus the lock-free
//! control channel that feeds it from other threads.

pub mod controller;
pub mod message;
pub mod oscillator;
pub mod synthesizer;
pub mod voice;

pub use controller::{Change, SynthController};
pub use message::{Retired, SynthMessage};
pub use oscillator::{Oscillator, Timbre};
pub use synthesizer::Synthesizer;
pub use voice::{Voice, VoiceState};
