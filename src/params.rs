//! Host automation surface: 6 parameters per oscillator, 24 in total.
//!
//! Hosts address parameters by a flat index (`oscillator * 6 + param`) and
//! exchange normalized values in 0.0 - 1.0. This module owns the mapping
//! between those values and engine units.

use crate::{MAX_ATTACK_MS, MAX_DECAY_MS, MAX_RELEASE_MS, NUM_AUTO_OSC_PARAMS, NUM_OSCILLATORS, NUM_PARAMS};

/// Octave shifts selectable from the host: -2 .. +2 octaves.
pub const TRANSPOSE_FACTORS: [f32; 5] = [0.25, 0.5, 1.0, 2.0, 4.0];

/// Automatable parameters of one oscillator, in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OscParam {
    Attack,
    Decay,
    Sustain,
    Release,
    /// Oscillator volume
    Level,
    /// Transpose factor, snapped to whole octaves
    Octave,
}

impl OscParam {
    pub const ALL: [OscParam; NUM_AUTO_OSC_PARAMS] = [
        OscParam::Attack,
        OscParam::Decay,
        OscParam::Sustain,
        OscParam::Release,
        OscParam::Level,
        OscParam::Octave,
    ];

    pub fn offset(self) -> usize {
        match self {
            OscParam::Attack => 0,
            OscParam::Decay => 1,
            OscParam::Sustain => 2,
            OscParam::Release => 3,
            OscParam::Level => 4,
            OscParam::Octave => 5,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            OscParam::Attack => "attack",
            OscParam::Decay => "decay",
            OscParam::Sustain => "sustain",
            OscParam::Release => "release",
            OscParam::Level => "level",
            OscParam::Octave => "octave",
        }
    }

    /// Unit label shown next to the value.
    pub fn label(self) -> &'static str {
        match self {
            OscParam::Attack | OscParam::Decay | OscParam::Release => "ms",
            OscParam::Sustain | OscParam::Level => "",
            OscParam::Octave => "octave",
        }
    }
}

/// A parameter of a specific oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId {
    pub oscillator: usize,
    pub param: OscParam,
}

impl ParamId {
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= NUM_PARAMS {
            return None;
        }
        Some(Self {
            oscillator: index / NUM_AUTO_OSC_PARAMS,
            param: OscParam::ALL[index % NUM_AUTO_OSC_PARAMS],
        })
    }

    /// Like `from_index`, but an out-of-range index is a caller bug.
    pub fn expect_index(index: usize) -> Self {
        match Self::from_index(index) {
            Some(id) => id,
            None => panic!("parameter index {index} out of range (0..{NUM_PARAMS})"),
        }
    }

    pub fn index(self) -> usize {
        debug_assert!(self.oscillator < NUM_OSCILLATORS);
        self.oscillator * NUM_AUTO_OSC_PARAMS + self.param.offset()
    }

    /// Host-facing name, e.g. "o2 release".
    pub fn name(self) -> String {
        format!("o{} {}", self.oscillator + 1, self.param.suffix())
    }

    pub fn label(self) -> &'static str {
        self.param.label()
    }
}

/// Iterate every parameter in host index order.
pub fn all_params() -> impl Iterator<Item = ParamId> {
    (0..NUM_PARAMS).map(ParamId::expect_index)
}

/// Snap a normalized 0..1 value to one of `TRANSPOSE_FACTORS`.
pub fn transpose_from_normalized(value: f32) -> f32 {
    if value < 0.125 {
        0.25
    } else if value < 0.375 {
        0.5
    } else if value < 0.625 {
        1.0
    } else if value < 0.875 {
        2.0
    } else {
        4.0
    }
}

/// Normalized value for a transpose factor: the centre of its snap band.
pub fn transpose_to_normalized(factor: f32) -> f32 {
    // log2 maps 0.25..4 onto -2..2
    ((factor.log2() + 2.0) / 4.0).clamp(0.0, 1.0)
}

pub(crate) fn attack_from_normalized(value: f32) -> u32 {
    (value.clamp(0.0, 1.0) * MAX_ATTACK_MS as f32) as u32
}

pub(crate) fn decay_from_normalized(value: f32) -> u32 {
    (value.clamp(0.0, 1.0) * MAX_DECAY_MS as f32) as u32
}

pub(crate) fn release_from_normalized(value: f32) -> u32 {
    (value.clamp(0.0, 1.0) * MAX_RELEASE_MS as f32) as u32
}

/// Format a normalized value for a host's parameter display.
pub fn display(id: ParamId, value: f32) -> String {
    match id.param {
        OscParam::Attack => format!("{}", attack_from_normalized(value)),
        OscParam::Decay => format!("{}", decay_from_normalized(value)),
        OscParam::Release => format!("{}", release_from_normalized(value)),
        OscParam::Sustain | OscParam::Level => format!("{value:.2}"),
        OscParam::Octave => {
            let octaves = transpose_from_normalized(value).log2() as i32;
            format!("{octaves:+}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_param_id() {
        for index in 0..NUM_PARAMS {
            assert_eq!(ParamId::expect_index(index).index(), index);
        }
        assert_eq!(ParamId::from_index(NUM_PARAMS), None);
    }

    #[test]
    fn layout_is_oscillator_major() {
        let id = ParamId::expect_index(9);
        assert_eq!(id.oscillator, 1);
        assert_eq!(id.param, OscParam::Release);
        assert_eq!(id.name(), "o2 release");
        assert_eq!(id.label(), "ms");
        assert_eq!(ParamId::expect_index(23).name(), "o4 octave");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_index_panics() {
        ParamId::expect_index(24);
    }

    #[test]
    fn transpose_snaps_to_octaves() {
        assert_eq!(transpose_from_normalized(0.0), 0.25);
        assert_eq!(transpose_from_normalized(0.2), 0.5);
        assert_eq!(transpose_from_normalized(0.5), 1.0);
        assert_eq!(transpose_from_normalized(0.7), 2.0);
        assert_eq!(transpose_from_normalized(1.0), 4.0);

        for (factor, centre) in TRANSPOSE_FACTORS.iter().zip([0.0, 0.25, 0.5, 0.75, 1.0]) {
            assert_eq!(transpose_to_normalized(*factor), centre);
            assert_eq!(transpose_from_normalized(centre), *factor);
        }
    }

    #[test]
    fn times_scale_to_500_ms() {
        assert_eq!(attack_from_normalized(0.5), 250);
        assert_eq!(decay_from_normalized(1.0), 500);
        assert_eq!(release_from_normalized(0.0), 0);
    }

    #[test]
    fn display_uses_engine_units() {
        assert_eq!(display(ParamId::expect_index(0), 0.2), "100");
        assert_eq!(display(ParamId::expect_index(5), 1.0), "+2");
        assert_eq!(display(ParamId::expect_index(4), 0.5), "0.50");
    }
}
