use std::f32::consts::TAU;

use crate::{dsp::pitch::lowest_freq, NUM_ADDITIVE_FREQS};

/*
Harmonic Tables
===============

Additive synthesis builds a timbre by summing sine waves at integer
multiples of a fundamental. Computing `sin()` for 64 partials per sample
per voice is far too expensive for the audio thread, so every partial is
rendered once into a lookup buffer when the engine starts.

All buffers share one length: a single cycle of the LOWEST playable pitch
(MIDI note 0, ~8.18 Hz). At 44.1 kHz that is 5393 samples.

  harmonic 0 (fundamental)   one cycle across the buffer
  harmonic 1                 two cycles
  harmonic k                 k+1 cycles

Higher notes are produced by reading the same buffer faster (see
`pitch::note_step`), so a single set of tables serves every note.

The tables are immutable after construction. Oscillators and synthesizer
instances share them through an `Arc`.
*/

/// Length of a buffer holding one cycle of the lowest playable pitch.
pub fn fundamental_period_len(sample_rate: f32) -> usize {
    (sample_rate / lowest_freq()) as usize
}

/// Render a sine at `frequency_hz` into a buffer of `len` samples.
///
/// `buffer[i] = sin(i * 2π / period)` with `period = sample_rate / frequency_hz`
/// kept fractional, so partials whose period does not divide the buffer
/// still start in phase.
pub fn build_harmonic(frequency_hz: f32, sample_rate: f32, len: usize) -> Vec<f32> {
    let period = sample_rate / frequency_hz;
    (0..len)
        .map(|i| (i as f32 * (TAU / period)).sin())
        .collect()
}

/// Precomputed single-cycle sines for each harmonic of the lowest pitch.
#[derive(Debug, Clone)]
pub struct HarmonicTable {
    sample_rate: f32,
    period_len: usize,
    harmonics: Vec<Box<[f32]>>,
}

impl HarmonicTable {
    pub fn new(sample_rate: f32) -> Self {
        let period_len = fundamental_period_len(sample_rate);
        let base = lowest_freq();

        let harmonics = (0..NUM_ADDITIVE_FREQS)
            .map(|k| {
                let freq = base * (k + 1) as f32;
                build_harmonic(freq, sample_rate, period_len).into_boxed_slice()
            })
            .collect();

        Self {
            sample_rate,
            period_len,
            harmonics,
        }
    }

    /// Samples of harmonic `index` (0 = fundamental).
    pub fn harmonic(&self, index: usize) -> &[f32] {
        &self.harmonics[index]
    }

    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }

    pub fn period_len(&self) -> usize {
        self.period_len
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
