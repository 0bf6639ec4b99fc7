use std::sync::{atomic::AtomicUsize, Arc};

use rtrb::{Consumer, Producer};

use crate::{dsp::Envelope, synth::oscillator::Timbre};

/// Control -> audio thread messages.
///
/// Table-carrying variants hold boxes built on the control thread; the audio
/// thread only swaps pointers.
#[derive(Debug)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: f32 },
    NoteOff { note: u8 },
    /// Global pitch factor (> 0), typically from the pitch wheel
    PitchBend { factor: f32 },
    AllNotesOff,
    Timbre { oscillator: usize, timbre: Box<Timbre> },
    Envelope { oscillator: usize, envelope: Box<Envelope> },
    Volume { oscillator: usize, volume: f32 },
    Transpose { oscillator: usize, factor: f32 },
}

/// Tables replaced on the audio thread, sent back to be freed elsewhere.
#[derive(Debug)]
pub enum Retired {
    Timbre(Box<Timbre>),
    Envelope(Box<Envelope>),
}

/// Control-side ends of a synthesizer's rings.
pub(crate) struct ControlEnds {
    pub tx: Producer<SynthMessage>,
    pub retired: Consumer<Retired>,
    /// Tables freed on the audio thread because the return ring was full
    pub discarded: Arc<AtomicUsize>,
}
