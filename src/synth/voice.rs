use std::hash::{Hash, Hasher};

use crate::{dsp::pitch::note_step, dsp::Envelope, synth::oscillator::Oscillator, NUM_OSCILLATORS};

/// Output magnitude below which a fading voice may restart without a click.
pub const FADE_OUT_THRESHOLD: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    AttackDecay, // Key held: reading the attack/decay table, then sustain
    Releasing,   // Key released: reading the release table
    FadingOut,   // Retriggered: playing on until the output is near zero
    Finished,    // Every envelope has run out; the voice can be dropped
}

/// One sounding note.
///
/// A voice owns no audio data. Each tick it reads the synthesizer's shared
/// oscillators with its own per-oscillator phase and a single envelope
/// position. Identity (`Eq`/`Hash`) is the MIDI note alone.
#[derive(Debug, Clone)]
pub struct Voice {
    note: u8,
    velocity: f32,
    /// Velocity to apply once a fade-out completes
    pending_velocity: f32,
    /// Phase increment relative to the lowest note
    step: f32,
    phases: [f32; NUM_OSCILLATORS],
    envelope_pos: usize,
    releasing: bool,
    fading_out: bool,
    finished: bool,
}

impl Voice {
    pub fn new(note: u8, velocity: f32) -> Self {
        Self {
            note,
            velocity,
            pending_velocity: velocity,
            step: note_step(note),
            phases: [0.0; NUM_OSCILLATORS],
            envelope_pos: 0,
            releasing: false,
            fading_out: false,
            finished: false,
        }
    }

    /// Render one sample from the shared oscillators.
    ///
    /// `pitch` is the global pitch-bend factor. Realtime-safe: no allocation,
    /// no locking.
    #[inline]
    pub fn next_sample(&mut self, oscillators: &[Oscillator; NUM_OSCILLATORS], pitch: f32) -> f32 {
        let mut sample = 0.0;

        // Cleared below by every envelope that still contributes
        let mut finished = true;
        let releasing = self.releasing;
        let pos = self.envelope_pos;
        let step = self.step * pitch;

        for (osc, phase) in oscillators.iter().zip(self.phases.iter_mut()) {
            if !osc.has_waveform() {
                continue;
            }

            let waveform = osc.waveform();
            let len = waveform.len() as f32;
            if *phase >= len {
                *phase %= len;
            }

            let (level, sounding) = envelope_value(osc.envelope(), pos, releasing);
            finished &= !sounding;

            sample += waveform.interpolated_sample(*phase) * level * osc.volume();
            *phase += step * osc.transpose();
        }

        self.finished = finished;
        self.envelope_pos = self.envelope_pos.saturating_add(1);

        let value = sample * self.velocity;

        if self.fading_out && value.abs() < FADE_OUT_THRESHOLD {
            self.restart();
        }

        value
    }

    /// Key released: restart the envelope read at the head of the release table.
    ///
    /// The release table always starts at the sustain level, even when the
    /// key is released during attack or decay.
    pub fn set_releasing(&mut self) {
        self.envelope_pos = 0;
        self.releasing = true;
    }

    /// Same key struck again while this voice is still sounding.
    ///
    /// The voice keeps playing its current state and restarts from the
    /// beginning with `velocity` once its output falls below
    /// `FADE_OUT_THRESHOLD`, avoiding a click from a mid-cycle reset.
    pub fn retrigger(&mut self, velocity: f32) {
        self.pending_velocity = velocity;
        self.fading_out = true;
    }

    fn restart(&mut self) {
        self.releasing = false;
        self.finished = false;
        self.envelope_pos = 0;
        self.phases = [0.0; NUM_OSCILLATORS];
        self.velocity = self.pending_velocity;
        self.fading_out = false;
    }

    pub fn state(&self) -> VoiceState {
        if self.finished {
            VoiceState::Finished
        } else if self.fading_out {
            VoiceState::FadingOut
        } else if self.releasing {
            VoiceState::Releasing
        } else {
            VoiceState::AttackDecay
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }

    pub fn envelope_position(&self) -> usize {
        self.envelope_pos
    }

    pub fn phase(&self, oscillator: usize) -> f32 {
        self.phases[oscillator]
    }
}

/// Envelope level at `pos`, and whether the envelope is still sounding.
#[inline]
fn envelope_value(envelope: &Envelope, pos: usize, releasing: bool) -> (f32, bool) {
    if !releasing {
        (envelope.value_at_attack_decay(pos), true)
    } else if pos < envelope.release_len() {
        (envelope.value_at_release(pos), true)
    } else {
        (0.0, false)
    }
}

impl PartialEq for Voice {
    fn eq(&self, other: &Self) -> bool {
        self.note == other.note
    }
}

impl Eq for Voice {}

impl Hash for Voice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.note.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::Adsr, dsp::HarmonicTable, NUM_ADDITIVE_FREQS};

    const SAMPLE_RATE: f32 = 44_100.0;

    fn oscillators(adsr: Adsr) -> [Oscillator; NUM_OSCILLATORS] {
        let table = Arc::new(HarmonicTable::new(SAMPLE_RATE));
        let mut oscs: [Oscillator; NUM_OSCILLATORS] =
            std::array::from_fn(|_| Oscillator::new(table.clone(), adsr));
        let mut levels = [0.0; NUM_ADDITIVE_FREQS];
        levels[0] = 1.0;
        oscs[0].set_additive_levels(&levels);
        oscs
    }

    #[test]
    fn identity_is_the_note() {
        let a = Voice::new(60, 0.2);
        let mut b = Voice::new(60, 0.9);
        b.set_releasing();
        assert_eq!(a, b);
        assert_ne!(a, Voice::new(61, 0.2));
    }

    #[test]
    fn silent_oscillators_finish_immediately() {
        let table = Arc::new(HarmonicTable::new(SAMPLE_RATE));
        let oscs = std::array::from_fn(|_| Oscillator::new(table.clone(), Adsr::default()));
        let mut voice = Voice::new(60, 1.0);

        assert_eq!(voice.next_sample(&oscs, 1.0), 0.0);
        assert_eq!(voice.state(), VoiceState::Finished);
    }

    #[test]
    fn held_voice_never_finishes() {
        let oscs = oscillators(Adsr::new(1, 1, 0.5, 1));
        let mut voice = Voice::new(69, 1.0);
        for _ in 0..10_000 {
            voice.next_sample(&oscs, 1.0);
        }
        assert_eq!(voice.state(), VoiceState::AttackDecay);
    }

    #[test]
    fn release_restarts_at_sustain_level() {
        let oscs = oscillators(Adsr::new(0, 0, 0.5, 100));
        let mut voice = Voice::new(69, 1.0);
        // Still inside the attack/decay table
        voice.next_sample(&oscs, 1.0);
        voice.set_releasing();

        assert_eq!(voice.envelope_position(), 0);
        assert_eq!(voice.state(), VoiceState::Releasing);
        // Release always reads from the head of its table
        let (level, _) = envelope_value(oscs[0].envelope(), voice.envelope_position(), true);
        assert_eq!(level, 0.5);
    }

    #[test]
    fn release_ends_after_release_table() {
        let oscs = oscillators(Adsr::new(0, 0, 1.0, 10));
        let release_len = oscs[0].envelope().release_len();
        let mut voice = Voice::new(69, 1.0);
        voice.set_releasing();

        for _ in 0..release_len {
            voice.next_sample(&oscs, 1.0);
            assert!(!voice.is_finished());
        }
        assert_eq!(voice.next_sample(&oscs, 1.0), 0.0);
        assert!(voice.is_finished());
    }

    #[test]
    fn phase_advances_by_note_step_times_transpose() {
        let mut oscs = oscillators(Adsr::default());
        oscs[0].set_transpose(2.0);
        let mut voice = Voice::new(12, 1.0);
        voice.next_sample(&oscs, 1.5);

        let expected = note_step(12) * 1.5 * 2.0;
        assert!((voice.phase(0) - expected).abs() < 1e-4);
        // Silent oscillators keep their phase at zero
        assert_eq!(voice.phase(1), 0.0);
    }

    #[test]
    fn phase_stays_inside_the_waveform() {
        let oscs = oscillators(Adsr::default());
        let len = oscs[0].waveform().len() as f32;
        let mut voice = Voice::new(127, 1.0);
        for _ in 0..1_000 {
            voice.next_sample(&oscs, 2.0);
            // Wrapped at the start of the next tick, so one step past the end at most
            assert!(voice.phase(0) < len + note_step(127) * 2.0);
        }
    }

    #[test]
    fn retrigger_waits_for_a_quiet_sample() {
        let oscs = oscillators(Adsr::new(0, 0, 1.0, 500));
        let mut voice = Voice::new(69, 1.0);

        // Move to a loud part of the cycle
        let mut value = 0.0f32;
        while value.abs() < 0.5 {
            value = voice.next_sample(&oscs, 1.0);
        }
        let pos = voice.envelope_position();
        voice.retrigger(0.4);
        assert_eq!(voice.state(), VoiceState::FadingOut);

        // The next sample is still loud: no reset yet
        let value = voice.next_sample(&oscs, 1.0);
        assert!(value.abs() >= FADE_OUT_THRESHOLD);
        assert_eq!(voice.envelope_position(), pos + 1);
        assert_eq!(voice.velocity(), 1.0);

        // Run until the zero crossing resets the voice
        let mut ticks = 0;
        while voice.state() == VoiceState::FadingOut {
            voice.next_sample(&oscs, 1.0);
            ticks += 1;
            assert!(ticks < 44_100, "fade-out never completed");
        }
        assert_eq!(voice.state(), VoiceState::AttackDecay);
        assert_eq!(voice.envelope_position(), 0);
        assert_eq!(voice.phase(0), 0.0);
        assert_eq!(voice.velocity(), 0.4);
    }

    #[test]
    fn retriggering_a_silent_voice_restarts_at_once() {
        let oscs = oscillators(Adsr::new(0, 0, 1.0, 0));
        let mut voice = Voice::new(69, 1.0);
        voice.set_releasing();
        for _ in 0..100 {
            voice.next_sample(&oscs, 1.0);
        }
        assert!(voice.is_finished());

        voice.retrigger(0.7);
        voice.next_sample(&oscs, 1.0);
        assert_eq!(voice.state(), VoiceState::AttackDecay);
        assert_eq!(voice.velocity(), 0.7);
    }
}
