use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer};

use crate::{
    config::{Adsr, SynthConfig},
    dsp::{Envelope, HarmonicTable},
    error::ControlError,
    io::{midi_to_synth, MidiEvent},
    params::{OscParam, ParamId},
    patch::Preset,
    synth::{
        message::{ControlEnds, Retired, SynthMessage},
        oscillator::Oscillator,
        synthesizer::Synthesizer,
    },
    NUM_OSCILLATORS,
};

/// What a controller mutation touched, reported to `on_change` listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Harmonic levels of one oscillator
    Timbre(usize),
    /// Envelope parameters of one oscillator
    Envelope(usize),
    /// Volume or transpose of one oscillator
    Oscillator(usize),
    Pitch,
    /// Every oscillator, e.g. after a preset load
    All,
    SampleRate,
}

type Listener = Box<dyn FnMut(Change) + Send>;

/// Control-thread handle to a `Synthesizer` running on the audio thread.
///
/// Keeps a mirror of the four oscillators. Table rebuilds happen here, on the
/// mirror; the audio thread only receives finished boxes and swaps them in.
/// Each mutation first checks that the queue has room for every message it
/// needs, so a `QueueFull` error leaves the mirror untouched.
pub struct SynthController {
    config: SynthConfig,
    harmonics: Arc<HarmonicTable>,
    oscillators: [Oscillator; NUM_OSCILLATORS],
    pitch: f32,
    tx: Producer<SynthMessage>,
    retired: Consumer<Retired>,
    discarded: Arc<AtomicUsize>,
    listeners: Vec<Listener>,
}

impl SynthController {
    pub(crate) fn new(
        config: SynthConfig,
        harmonics: Arc<HarmonicTable>,
        oscillators: [Oscillator; NUM_OSCILLATORS],
        ends: ControlEnds,
    ) -> Self {
        Self {
            config,
            harmonics,
            oscillators,
            pitch: 1.0,
            tx: ends.tx,
            retired: ends.retired,
            discarded: ends.discarded,
            listeners: Vec::new(),
        }
    }

    /// Feed one MIDI event received on `channel` to the synthesizer.
    ///
    /// Events on other channels and messages the synth ignores succeed
    /// without sending anything.
    pub fn handle_midi(&mut self, event: MidiEvent, channel: u8) -> Result<(), ControlError> {
        if let MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } = event {
            if key >= 128 {
                log::warn!("ignoring MIDI event with out-of-range key {key}");
                return Err(ControlError::InvalidNote(key));
            }
        }

        match midi_to_synth(event, channel) {
            Some(SynthMessage::NoteOn { note, velocity }) => self.note_on(note, velocity),
            Some(SynthMessage::NoteOff { note }) => self.note_off(note),
            Some(SynthMessage::AllNotesOff) => self.all_notes_off(),
            Some(SynthMessage::PitchBend { factor }) => self.set_pitch(factor),
            // Oscillator changes never come from MIDI
            Some(_) | None => Ok(()),
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: f32) -> Result<(), ControlError> {
        assert!(note < 128, "MIDI note out of range: {note}");
        self.reserve(1)?;
        self.send(SynthMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), ControlError> {
        self.reserve(1)?;
        self.send(SynthMessage::NoteOff { note })
    }

    pub fn all_notes_off(&mut self) -> Result<(), ControlError> {
        self.reserve(1)?;
        self.send(SynthMessage::AllNotesOff)
    }

    /// Set the global pitch factor (1.0 = no bend).
    pub fn set_pitch(&mut self, factor: f32) -> Result<(), ControlError> {
        assert!(factor > 0.0, "pitch factor must be positive, got {factor}");
        self.reserve(1)?;
        self.pitch = factor;
        self.send(SynthMessage::PitchBend { factor })?;
        self.notify(Change::Pitch);
        Ok(())
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_additive_levels(&mut self, oscillator: usize, levels: &[f32]) -> Result<(), ControlError> {
        self.reserve(1)?;
        self.oscillators[oscillator].set_additive_levels(levels);
        self.send_timbre(oscillator)?;
        self.notify(Change::Timbre(oscillator));
        Ok(())
    }

    pub fn set_additive_level(&mut self, oscillator: usize, index: usize, level: f32) -> Result<(), ControlError> {
        self.reserve(1)?;
        self.oscillators[oscillator].set_additive_level(index, level);
        self.send_timbre(oscillator)?;
        self.notify(Change::Timbre(oscillator));
        Ok(())
    }

    pub fn set_adsr(&mut self, oscillator: usize, adsr: Adsr) -> Result<(), ControlError> {
        self.update_envelope(oscillator, |env| env.set_from(adsr))
    }

    pub fn set_attack(&mut self, oscillator: usize, attack_ms: u32) -> Result<(), ControlError> {
        self.update_envelope(oscillator, |env| env.set_attack(attack_ms))
    }

    pub fn set_decay(&mut self, oscillator: usize, decay_ms: u32) -> Result<(), ControlError> {
        self.update_envelope(oscillator, |env| env.set_decay(decay_ms))
    }

    pub fn set_sustain(&mut self, oscillator: usize, sustain: f32) -> Result<(), ControlError> {
        self.update_envelope(oscillator, |env| env.set_sustain(sustain))
    }

    pub fn set_release(&mut self, oscillator: usize, release_ms: u32) -> Result<(), ControlError> {
        self.update_envelope(oscillator, |env| env.set_release(release_ms))
    }

    pub fn set_volume(&mut self, oscillator: usize, volume: f32) -> Result<(), ControlError> {
        self.reserve(1)?;
        self.oscillators[oscillator].set_volume(volume);
        let volume = self.oscillators[oscillator].volume();
        self.send(SynthMessage::Volume { oscillator, volume })?;
        self.notify(Change::Oscillator(oscillator));
        Ok(())
    }

    pub fn set_transpose(&mut self, oscillator: usize, factor: f32) -> Result<(), ControlError> {
        self.reserve(1)?;
        self.oscillators[oscillator].set_transpose(factor);
        self.send(SynthMessage::Transpose { oscillator, factor })?;
        self.notify(Change::Oscillator(oscillator));
        Ok(())
    }

    /// Write an automation parameter (normalized). Panics on a bad index.
    pub fn set_parameter(&mut self, index: usize, value: f32) -> Result<(), ControlError> {
        let id = ParamId::expect_index(index);
        self.reserve(1)?;

        let osc = &mut self.oscillators[id.oscillator];
        osc.set_parameter(id.param, value);

        let (msg, change) = match id.param {
            OscParam::Attack | OscParam::Decay | OscParam::Sustain | OscParam::Release => (
                SynthMessage::Envelope {
                    oscillator: id.oscillator,
                    envelope: Box::new(osc.envelope().clone()),
                },
                Change::Envelope(id.oscillator),
            ),
            OscParam::Level => (
                SynthMessage::Volume {
                    oscillator: id.oscillator,
                    volume: osc.volume(),
                },
                Change::Oscillator(id.oscillator),
            ),
            OscParam::Octave => (
                SynthMessage::Transpose {
                    oscillator: id.oscillator,
                    factor: osc.transpose(),
                },
                Change::Oscillator(id.oscillator),
            ),
        };

        self.send(msg)?;
        self.notify(change);
        Ok(())
    }

    /// Read an automation parameter from the mirror. Panics on a bad index.
    pub fn parameter(&self, index: usize) -> f32 {
        let id = ParamId::expect_index(index);
        self.oscillators[id.oscillator].parameter(id.param)
    }

    /// Load a preset into every oscillator.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<(), ControlError> {
        self.reserve(4 * NUM_OSCILLATORS)?;
        preset.apply(&mut self.oscillators);
        self.send_all()?;
        self.notify(Change::All);
        Ok(())
    }

    /// Resend the full mirrored state, e.g. after earlier sends were dropped.
    pub fn resync(&mut self) -> Result<(), ControlError> {
        self.reserve(4 * NUM_OSCILLATORS + 1)?;
        self.send_all()?;
        self.send(SynthMessage::PitchBend { factor: self.pitch })
    }

    pub fn snapshot(&self, name: impl Into<String>) -> Preset {
        Preset::capture(name, &self.oscillators)
    }

    /// Mirrored oscillator state, for display.
    pub fn oscillator(&self, index: usize) -> &Oscillator {
        &self.oscillators[index]
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    /// Register a listener called after every successful mutation.
    pub fn on_change(&mut self, listener: impl FnMut(Change) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Free tables the audio thread has swapped out. Returns how many were
    /// dropped. Every sending call does this too.
    pub fn collect_garbage(&mut self) -> usize {
        let mut freed = 0;
        while let Ok(retired) = self.retired.pop() {
            drop(retired);
            freed += 1;
        }
        freed
    }

    /// Tables the audio thread had to free itself because they were not
    /// collected in time. Stays at zero while the controller keeps sending.
    pub fn discarded_on_audio_thread(&self) -> usize {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Rebuild every table for a new sample rate and return a fresh
    /// synthesizer carrying the current sound, connected to this controller.
    ///
    /// The host replaces its audio-side synthesizer with the returned one;
    /// the old one no longer receives messages.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Synthesizer {
        log::info!(
            "rebuilding synthesizer for {sample_rate} Hz (was {} Hz)",
            self.config.sample_rate
        );

        self.config.sample_rate = sample_rate;
        self.harmonics = Arc::new(HarmonicTable::new(sample_rate));
        for osc in &mut self.oscillators {
            osc.rebuild_for_table(self.harmonics.clone());
        }

        let mut synth = Synthesizer::with_harmonics(self.config.clone(), self.harmonics.clone());
        synth.install_oscillators(self.oscillators.clone());
        synth.set_pitch(self.pitch);

        let ends = synth.connect();
        self.tx = ends.tx;
        self.retired = ends.retired;
        self.discarded = ends.discarded;

        self.notify(Change::SampleRate);
        synth
    }

    fn update_envelope(
        &mut self,
        oscillator: usize,
        update: impl FnOnce(&mut Envelope),
    ) -> Result<(), ControlError> {
        self.reserve(1)?;
        update(self.oscillators[oscillator].envelope_mut());
        self.send_envelope(oscillator)?;
        self.notify(Change::Envelope(oscillator));
        Ok(())
    }

    fn send_timbre(&mut self, oscillator: usize) -> Result<(), ControlError> {
        let timbre = Box::new(self.oscillators[oscillator].timbre().clone());
        self.send(SynthMessage::Timbre { oscillator, timbre })
    }

    fn send_envelope(&mut self, oscillator: usize) -> Result<(), ControlError> {
        let envelope = Box::new(self.oscillators[oscillator].envelope().clone());
        self.send(SynthMessage::Envelope {
            oscillator,
            envelope,
        })
    }

    fn send_all(&mut self) -> Result<(), ControlError> {
        for oscillator in 0..NUM_OSCILLATORS {
            self.send_timbre(oscillator)?;
            self.send_envelope(oscillator)?;
            let osc = &self.oscillators[oscillator];
            let (volume, factor) = (osc.volume(), osc.transpose());
            self.send(SynthMessage::Volume { oscillator, volume })?;
            self.send(SynthMessage::Transpose { oscillator, factor })?;
        }
        Ok(())
    }

    /// Fail before mutating anything if `count` messages would not fit.
    fn reserve(&mut self, count: usize) -> Result<(), ControlError> {
        self.collect_garbage();
        if self.tx.slots() < count {
            log::warn!(
                "control queue full ({} free, {count} needed), dropping change",
                self.tx.slots()
            );
            return Err(ControlError::QueueFull);
        }
        Ok(())
    }

    fn send(&mut self, msg: SynthMessage) -> Result<(), ControlError> {
        self.tx.push(msg).map_err(|_| {
            log::warn!("control queue full, dropping message");
            ControlError::QueueFull
        })
    }

    fn notify(&mut self, change: Change) {
        for listener in &mut self.listeners {
            listener(change);
        }
    }
}
