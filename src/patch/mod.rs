//! Presets: named snapshots of all oscillator settings.
//!
//! The engine only knows how to capture and apply a `Preset`. Where presets
//! live is up to a `PresetSource`; `PresetLibrary` loads them once in the
//! background and shares them between synthesizer instances.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{config::Adsr, error::PresetError, synth::oscillator::Oscillator, NUM_ADDITIVE_FREQS, NUM_OSCILLATORS};

pub mod library;
#[cfg(feature = "serde")]
pub mod store;

pub use library::{PresetLibrary, PresetSource};
#[cfg(feature = "serde")]
pub use store::JsonPresetStore;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorPreset {
    /// One level per harmonic, -1.0 - 1.0
    pub levels: Vec<f32>,
    pub transpose: f32,
    pub volume: f32,
    pub envelope: Adsr,
}

impl OscillatorPreset {
    pub fn capture(osc: &Oscillator) -> Self {
        Self {
            levels: osc.additive_levels().to_vec(),
            transpose: osc.transpose(),
            volume: osc.volume(),
            envelope: osc.envelope().adsr(),
        }
    }

    /// Write these settings into `osc`, rebuilding its tables.
    pub fn apply(&self, osc: &mut Oscillator) {
        osc.set_additive_levels(&self.levels);
        osc.set_transpose(self.transpose);
        osc.set_volume(self.volume);
        osc.envelope_mut().set_from(self.envelope);
    }

    fn validate(&self) -> Result<(), PresetError> {
        if self.levels.len() != NUM_ADDITIVE_FREQS {
            return Err(PresetError::Invalid(format!(
                "expected {NUM_ADDITIVE_FREQS} harmonic levels, found {}",
                self.levels.len()
            )));
        }
        if self.transpose.is_nan() || self.transpose <= 0.0 {
            return Err(PresetError::Invalid(format!(
                "transpose factor must be positive, found {}",
                self.transpose
            )));
        }
        Ok(())
    }
}

impl Default for OscillatorPreset {
    fn default() -> Self {
        Self {
            levels: vec![0.0; NUM_ADDITIVE_FREQS],
            transpose: 1.0,
            volume: 1.0,
            envelope: Adsr::default(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub oscillators: [OscillatorPreset; NUM_OSCILLATORS],
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oscillators: Default::default(),
        }
    }

    /// Snapshot the current settings of `oscillators`.
    pub fn capture(name: impl Into<String>, oscillators: &[Oscillator; NUM_OSCILLATORS]) -> Self {
        Self {
            name: name.into(),
            oscillators: std::array::from_fn(|i| OscillatorPreset::capture(&oscillators[i])),
        }
    }

    /// Overwrite `oscillators` with this preset.
    ///
    /// Panics if the preset is malformed; presets from a `PresetSource` are
    /// validated when loaded.
    pub fn apply(&self, oscillators: &mut [Oscillator; NUM_OSCILLATORS]) {
        for (preset, osc) in self.oscillators.iter().zip(oscillators.iter_mut()) {
            preset.apply(osc);
        }
    }

    /// Library order: by name ignoring case, exact name as tie-break.
    ///
    /// Only names take part, so this is a sort key rather than an `Ord`.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }

    /// Check that the preset can be applied without panicking.
    pub fn validate(&self) -> Result<(), PresetError> {
        self.oscillators.iter().try_for_each(OscillatorPreset::validate)
    }
}
