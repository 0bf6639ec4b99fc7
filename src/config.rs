//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::DEFAULT_SAMPLE_RATE;

/// Plain-data envelope parameters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack_ms: u32,
    pub decay_ms: u32,
    /// Sustain level, 0.0 - 1.0
    pub sustain: f32,
    pub release_ms: u32,
}

impl Adsr {
    pub const fn new(attack_ms: u32, decay_ms: u32, sustain: f32, release_ms: u32) -> Self {
        Self {
            attack_ms,
            decay_ms,
            sustain,
            release_ms,
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(10, 44, 0.3, 200)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Host sample rate in Hz. Sizes every table in the engine.
    pub sample_rate: f32,
    /// Capacity of the control -> audio message ring.
    pub message_queue_size: usize,
    /// Envelope applied to every oscillator of a new synthesizer.
    pub initial_envelope: Adsr,
}

impl SynthConfig {
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            message_queue_size: 1024,
            initial_envelope: Adsr::new(1, 51, 0.8, 500),
        }
    }
}
