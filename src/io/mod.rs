//! Host glue: MIDI events and their translation into synth messages.

pub mod converter;
pub mod midi;

pub use converter::{midi_to_synth, pitch_bend_to_factor};
pub use midi::MidiEvent;
