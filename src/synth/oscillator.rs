use std::sync::Arc;

use crate::{
    config::Adsr,
    dsp::{Envelope, HarmonicTable, Waveform},
    params::{self, OscParam},
    MAX_ATTACK_MS, MAX_DECAY_MS, MAX_RELEASE_MS, NUM_ADDITIVE_FREQS,
};

/// Harmonic levels together with the waveform rendered from them.
///
/// Kept as one unit so a rebuilt timbre can be handed to the audio thread
/// in a single pointer swap.
#[derive(Debug, Clone, PartialEq)]
pub struct Timbre {
    levels: [f32; NUM_ADDITIVE_FREQS],
    waveform: Waveform,
    audible: bool,
}

impl Timbre {
    pub fn silent(harmonics: &HarmonicTable) -> Self {
        Self {
            levels: [0.0; NUM_ADDITIVE_FREQS],
            waveform: Waveform::for_table(harmonics),
            audible: false,
        }
    }

    /// Replace all levels and re-render the waveform.
    ///
    /// Panics unless exactly `NUM_ADDITIVE_FREQS` levels are given.
    pub fn set_levels(&mut self, levels: &[f32], harmonics: &HarmonicTable) {
        assert_eq!(
            levels.len(),
            NUM_ADDITIVE_FREQS,
            "expected {NUM_ADDITIVE_FREQS} harmonic levels"
        );
        for (dst, &src) in self.levels.iter_mut().zip(levels) {
            *dst = src.clamp(-1.0, 1.0);
        }
        self.audible = self.waveform.rebuild(&self.levels, harmonics);
    }

    /// Change a single harmonic level and re-render.
    pub fn set_level(&mut self, index: usize, level: f32, harmonics: &HarmonicTable) {
        self.levels[index] = level.clamp(-1.0, 1.0);
        self.audible = self.waveform.rebuild(&self.levels, harmonics);
    }

    /// Re-render against a different table (after a sample rate change).
    pub fn rebuild(&mut self, harmonics: &HarmonicTable) {
        self.waveform = Waveform::for_table(harmonics);
        self.audible = self.waveform.rebuild(&self.levels, harmonics);
    }

    pub fn levels(&self) -> &[f32; NUM_ADDITIVE_FREQS] {
        &self.levels
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// True if at least one level is nonzero.
    pub fn is_audible(&self) -> bool {
        self.audible
    }
}

/// One additive oscillator: a timbre, an amplitude envelope, a volume and a
/// transpose factor.
///
/// The oscillator is shared by every voice; voices keep their own phase and
/// envelope position.
#[derive(Debug, Clone)]
pub struct Oscillator {
    harmonics: Arc<HarmonicTable>,
    timbre: Box<Timbre>,
    envelope: Box<Envelope>,
    volume: f32,
    transpose: f32,
}

impl Oscillator {
    pub fn new(harmonics: Arc<HarmonicTable>, adsr: Adsr) -> Self {
        let timbre = Box::new(Timbre::silent(&harmonics));
        let envelope = Box::new(Envelope::from_adsr(harmonics.sample_rate(), adsr));

        Self {
            harmonics,
            timbre,
            envelope,
            volume: 1.0,
            transpose: 1.0,
        }
    }

    /// Set every harmonic level (each -1..=1; negative levels subtract the
    /// partial). Panics unless exactly `NUM_ADDITIVE_FREQS` levels are given.
    pub fn set_additive_levels(&mut self, levels: &[f32]) {
        self.timbre.set_levels(levels, &self.harmonics);
    }

    pub fn set_additive_level(&mut self, index: usize, level: f32) {
        self.timbre.set_level(index, level, &self.harmonics);
    }

    pub fn additive_levels(&self) -> &[f32; NUM_ADDITIVE_FREQS] {
        self.timbre.levels()
    }

    /// Whether this oscillator contributes to the mix at all.
    #[inline]
    pub fn has_waveform(&self) -> bool {
        self.timbre.is_audible()
    }

    #[inline]
    pub fn waveform(&self) -> &Waveform {
        self.timbre.waveform()
    }

    pub fn timbre(&self) -> &Timbre {
        &self.timbre
    }

    #[inline]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Pitch multiplier: 0.5 = one octave down, 2.0 = one octave up.
    #[inline]
    pub fn transpose(&self) -> f32 {
        self.transpose
    }

    pub fn set_transpose(&mut self, factor: f32) {
        assert!(factor > 0.0, "transpose factor must be positive, got {factor}");
        self.transpose = factor;
    }

    pub fn harmonics(&self) -> &Arc<HarmonicTable> {
        &self.harmonics
    }

    /// Read a parameter in normalized host units.
    pub fn parameter(&self, param: OscParam) -> f32 {
        match param {
            OscParam::Attack => self.envelope.attack_ms() as f32 / MAX_ATTACK_MS as f32,
            OscParam::Decay => self.envelope.decay_ms() as f32 / MAX_DECAY_MS as f32,
            OscParam::Sustain => self.envelope.sustain(),
            OscParam::Release => self.envelope.release_ms() as f32 / MAX_RELEASE_MS as f32,
            OscParam::Level => self.volume,
            OscParam::Octave => params::transpose_to_normalized(self.transpose),
        }
    }

    /// Write a parameter from normalized host units.
    pub fn set_parameter(&mut self, param: OscParam, value: f32) {
        match param {
            OscParam::Attack => self.envelope.set_attack(params::attack_from_normalized(value)),
            OscParam::Decay => self.envelope.set_decay(params::decay_from_normalized(value)),
            OscParam::Sustain => self.envelope.set_sustain(value),
            OscParam::Release => self.envelope.set_release(params::release_from_normalized(value)),
            OscParam::Level => self.set_volume(value),
            OscParam::Octave => self.set_transpose(params::transpose_from_normalized(value)),
        }
    }

    /// Rebuild waveform and envelope for a new harmonic table.
    pub fn rebuild_for_table(&mut self, harmonics: Arc<HarmonicTable>) {
        self.timbre.rebuild(&harmonics);
        self.envelope.rebuild_for_sample_rate(harmonics.sample_rate());
        self.harmonics = harmonics;
    }

    /// Swap in a timbre built elsewhere, returning the previous one.
    pub(crate) fn replace_timbre(&mut self, timbre: Box<Timbre>) -> Box<Timbre> {
        std::mem::replace(&mut self.timbre, timbre)
    }

    /// Swap in an envelope built elsewhere, returning the previous one.
    pub(crate) fn replace_envelope(&mut self, envelope: Box<Envelope>) -> Box<Envelope> {
        std::mem::replace(&mut self.envelope, envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillator() -> Oscillator {
        Oscillator::new(Arc::new(HarmonicTable::new(44_100.0)), Adsr::default())
    }

    #[test]
    fn starts_silent() {
        let osc = oscillator();
        assert!(!osc.has_waveform());
        assert_eq!(osc.volume(), 1.0);
        assert_eq!(osc.transpose(), 1.0);
    }

    #[test]
    fn any_nonzero_level_makes_it_audible() {
        let mut osc = oscillator();
        osc.set_additive_level(12, -0.3);
        assert!(osc.has_waveform());
        assert!((osc.waveform().peak() - 1.0).abs() < 1e-6);

        osc.set_additive_level(12, 0.0);
        assert!(!osc.has_waveform());
    }

    #[test]
    fn levels_are_clamped() {
        let mut osc = oscillator();
        let mut levels = [0.0; NUM_ADDITIVE_FREQS];
        levels[0] = 3.0;
        levels[1] = -2.0;
        osc.set_additive_levels(&levels);
        assert_eq!(osc.additive_levels()[0], 1.0);
        assert_eq!(osc.additive_levels()[1], -1.0);
    }

    #[test]
    #[should_panic]
    fn wrong_level_count_panics() {
        oscillator().set_additive_levels(&[1.0; 3]);
    }

    #[test]
    #[should_panic]
    fn level_index_out_of_range_panics() {
        oscillator().set_additive_level(NUM_ADDITIVE_FREQS, 1.0);
    }

    #[test]
    fn normalized_parameters_map_to_engine_units() {
        let mut osc = oscillator();
        osc.set_parameter(OscParam::Attack, 0.5);
        osc.set_parameter(OscParam::Release, 1.0);
        osc.set_parameter(OscParam::Octave, 0.8);
        osc.set_parameter(OscParam::Level, 0.25);

        assert_eq!(osc.envelope().attack_ms(), 250);
        assert_eq!(osc.envelope().release_ms(), 500);
        assert_eq!(osc.transpose(), 2.0);
        assert_eq!(osc.volume(), 0.25);
        assert_eq!(osc.parameter(OscParam::Attack), 0.5);
        assert_eq!(osc.parameter(OscParam::Octave), 0.75);
    }
}
