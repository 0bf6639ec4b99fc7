use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::SynthConfig,
    dsp::HarmonicTable,
    params::ParamId,
    patch::Preset,
    synth::{
        controller::SynthController,
        message::{ControlEnds, Retired, SynthMessage},
        oscillator::Oscillator,
        voice::Voice,
    },
    MAX_VOICES, NUM_OSCILLATORS,
};

/// Audio-thread ends of the control channel.
struct AudioLink {
    rx: Consumer<SynthMessage>,
    retired: Producer<Retired>,
    discarded: Arc<AtomicUsize>,
}

impl AudioLink {
    /// Hand a swapped-out table back to the control side.
    ///
    /// Both rings have the same capacity and the controller drains this one
    /// before every send, so it only fills up if the controller stops
    /// collecting. The table is then freed here and counted.
    fn retire(&mut self, table: Retired) {
        if self.retired.push(table).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Polyphonic additive synthesizer.
///
/// Owns four oscillators shared by every voice and at most one voice per
/// MIDI note, kept in note-on order. `next_sample` and `render_block` are
/// realtime-safe; everything that rebuilds tables is control-path only.
pub struct Synthesizer {
    config: SynthConfig,
    harmonics: Arc<HarmonicTable>,
    oscillators: [Oscillator; NUM_OSCILLATORS],
    voices: Vec<Voice>,
    pitch: f32,
    link: Option<AudioLink>,
}

impl Synthesizer {
    pub fn new(config: SynthConfig) -> Self {
        let harmonics = Arc::new(HarmonicTable::new(config.sample_rate));
        Self::with_harmonics(config, harmonics)
    }

    /// Build on an existing harmonic table, shared with other instances.
    ///
    /// Panics if the table was built for a different sample rate.
    pub fn with_harmonics(config: SynthConfig, harmonics: Arc<HarmonicTable>) -> Self {
        assert_eq!(
            harmonics.sample_rate(),
            config.sample_rate,
            "harmonic table sample rate does not match config"
        );

        let oscillators = std::array::from_fn(|_| Oscillator::new(harmonics.clone(), config.initial_envelope));

        Self {
            config,
            harmonics,
            oscillators,
            // One slot per MIDI note: inserting never reallocates
            voices: Vec::with_capacity(MAX_VOICES),
            pitch: 1.0,
            link: None,
        }
    }

    /// Create a synthesizer for the audio thread and a controller for
    /// everything else, connected by lock-free rings.
    pub fn with_controller(config: SynthConfig) -> (Self, SynthController) {
        let mut synth = Self::new(config);
        let ends = synth.connect();

        let controller = SynthController::new(
            synth.config.clone(),
            synth.harmonics.clone(),
            synth.oscillators.clone(),
            ends,
        );

        (synth, controller)
    }

    /// Open fresh control rings, replacing any previous link.
    pub(crate) fn connect(&mut self) -> ControlEnds {
        let size = self.config.message_queue_size;
        let (tx, rx) = RingBuffer::<SynthMessage>::new(size);
        let (retired_tx, retired_rx) = RingBuffer::<Retired>::new(size);
        let discarded = Arc::new(AtomicUsize::new(0));
        self.link = Some(AudioLink {
            rx,
            retired: retired_tx,
            discarded: discarded.clone(),
        });
        ControlEnds {
            tx,
            retired: retired_rx,
            discarded,
        }
    }

    /// Install oscillators prepared on the control side for this table.
    pub(crate) fn install_oscillators(&mut self, oscillators: [Oscillator; NUM_OSCILLATORS]) {
        self.oscillators = oscillators;
    }

    /// Start `note`, or retrigger it if it is still sounding.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        let velocity = velocity.clamp(0.0, 1.0);
        match self.voices.iter_mut().find(|voice| voice.note() == note) {
            Some(voice) => voice.retrigger(velocity),
            None => self.voices.push(Voice::new(note, velocity)),
        }
    }

    /// Release `note`. Unknown notes are ignored.
    pub fn note_off(&mut self, note: u8) {
        if let Some(voice) = self.voices.iter_mut().find(|voice| voice.note() == note) {
            voice.set_releasing();
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.set_releasing();
        }
    }

    /// Mix one output sample from every active voice.
    ///
    /// Voices that have finished are dropped from the active set. The sum is
    /// not clipped.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let oscillators = &self.oscillators;
        let pitch = self.pitch;
        let mut sum = 0.0;

        self.voices.retain_mut(|voice| {
            if voice.is_finished() {
                return false;
            }
            sum += voice.next_sample(oscillators, pitch);
            // A voice that just ran out rendered silence; drop it now
            !voice.is_finished()
        });

        sum
    }

    /// Apply pending control messages, then fill `out` one sample per frame.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.process_messages();
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Drain the control queue. Does nothing without a controller.
    pub fn process_messages(&mut self) {
        let Some(mut link) = self.link.take() else {
            return;
        };

        while let Ok(msg) = link.rx.pop() {
            self.apply_message(msg, &mut link);
        }

        self.link = Some(link);
    }

    fn apply_message(&mut self, msg: SynthMessage, link: &mut AudioLink) {
        match msg {
            SynthMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
            SynthMessage::NoteOff { note } => self.note_off(note),
            SynthMessage::PitchBend { factor } => self.set_pitch(factor),
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::Timbre { oscillator, timbre } => {
                let old = self.oscillators[oscillator].replace_timbre(timbre);
                link.retire(Retired::Timbre(old));
            }
            SynthMessage::Envelope {
                oscillator,
                envelope,
            } => {
                let old = self.oscillators[oscillator].replace_envelope(envelope);
                link.retire(Retired::Envelope(old));
            }
            SynthMessage::Volume { oscillator, volume } => {
                self.oscillators[oscillator].set_volume(volume);
            }
            SynthMessage::Transpose { oscillator, factor } => {
                self.oscillators[oscillator].set_transpose(factor);
            }
        }
    }

    /// Global pitch multiplier applied to every voice (1.0 = no bend).
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_pitch(&mut self, factor: f32) {
        assert!(factor > 0.0, "pitch factor must be positive, got {factor}");
        self.pitch = factor;
    }

    pub fn oscillator(&self, index: usize) -> &Oscillator {
        &self.oscillators[index]
    }

    /// Direct access for single-threaded use. With a controller attached,
    /// change oscillators through the controller instead.
    pub fn oscillator_mut(&mut self, index: usize) -> &mut Oscillator {
        &mut self.oscillators[index]
    }

    pub fn oscillators(&self) -> &[Oscillator; NUM_OSCILLATORS] {
        &self.oscillators
    }

    /// Active voices in note-on order.
    pub fn active_voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, note: u8) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.note() == note)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Read an automation parameter (normalized). Panics on a bad index.
    pub fn parameter(&self, index: usize) -> f32 {
        let id = ParamId::expect_index(index);
        self.oscillators[id.oscillator].parameter(id.param)
    }

    /// Write an automation parameter (normalized). Panics on a bad index.
    pub fn set_parameter(&mut self, index: usize, value: f32) {
        let id = ParamId::expect_index(index);
        self.oscillators[id.oscillator].set_parameter(id.param, value);
    }

    pub fn snapshot(&self, name: impl Into<String>) -> Preset {
        Preset::capture(name, &self.oscillators)
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        preset.apply(&mut self.oscillators);
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn harmonics(&self) -> &Arc<HarmonicTable> {
        &self.harmonics
    }

    /// Rebuild every table for a new host sample rate and silence all voices.
    ///
    /// Allocates: call it while the audio stream is stopped. A controller
    /// paired with this synthesizer keeps building tables for the old rate;
    /// use `SynthController::with_sample_rate` for a new pair instead.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate == self.config.sample_rate {
            return;
        }
        log::info!(
            "sample rate changed from {} to {sample_rate} Hz, rebuilding tables",
            self.config.sample_rate
        );

        self.config.sample_rate = sample_rate;
        self.harmonics = Arc::new(HarmonicTable::new(sample_rate));
        for osc in &mut self.oscillators {
            osc.rebuild_for_table(self.harmonics.clone());
        }
        self.voices.clear();
    }
}
