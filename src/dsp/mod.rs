//! Low-level DSP primitives used by the synthesizer.
//!
//! Reads from these components are allocation-free and realtime-safe. Table
//! construction (harmonics, envelope tables) allocates and belongs on the
//! control path; waveform rebuilds reuse their buffer.

/// Table-driven ADSR envelope.
pub mod envelope;
/// Precomputed single-cycle sines for each harmonic.
pub mod harmonics;
/// MIDI note to frequency conversion.
pub mod pitch;
/// Additive single-cycle waveform with interpolated reads.
pub mod waveform;

pub use envelope::Envelope;
pub use harmonics::HarmonicTable;
pub use waveform::Waveform;
