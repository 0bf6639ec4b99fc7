//! Polyphonic additive synthesis engine.
//!
//! Four oscillators, each built from 64 harmonic sines and shaped by a table
//! ADSR envelope, are shared by up to one voice per MIDI note. The
//! `Synthesizer` renders on the audio thread; a `SynthController` changes it
//! from anywhere else through a lock-free queue.

pub mod config;
pub mod dsp; // Harmonic tables, waveforms, envelopes
pub mod error;
pub mod io; // MIDI glue
pub mod params; // Host automation surface
pub mod patch; // Presets
pub mod synth; // Voices and polyphony

pub use config::{Adsr, SynthConfig};
pub use error::{ControlError, PresetError};
pub use synth::{SynthController, Synthesizer};

pub const NUM_OSCILLATORS: usize = 4;
pub const NUM_ADDITIVE_FREQS: usize = 64;

pub const MAX_ATTACK_MS: u32 = 500;
pub const MAX_DECAY_MS: u32 = 500;
pub const MAX_RELEASE_MS: u32 = 500;

/// Automation parameters per oscillator: attack, decay, sustain, release, level, octave.
pub const NUM_AUTO_OSC_PARAMS: usize = 6;
pub const NUM_PARAMS: usize = NUM_OSCILLATORS * NUM_AUTO_OSC_PARAMS;

/// One voice per MIDI note.
pub const MAX_VOICES: usize = 128;

pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;
pub const MAX_BLOCK_SIZE: usize = 2048;
