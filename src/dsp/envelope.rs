use crate::config::Adsr;

/*
Table-Driven ADSR Envelope
==========================

Unlike a running state machine that advances a level every sample, this
envelope is pre-rendered into two lookup tables whenever a parameter
changes. Voices then read the tables by position, so any number of voices
can share one envelope without per-voice envelope state.

  attack_decay   rises linearly to 1.0 over the attack time, then falls
                 linearly towards the sustain level over the decay time.
                 Reads past the end return the sustain level (held note).

  release        starts at the sustain level and falls linearly towards 0
                 over the release time. Reads past the end return 0.

  Level
    1.0 ┐   ╱╲
        │  ╱  ╲
    S   │ ╱    ╲_____________  ┆ S ╲
        │╱       (held)        ┆     ╲
    0.0 └──────────────────────┴──────╲──→ position
         attack  decay          release table

Click Prevention
----------------

A decay or release of a handful of samples is an instant jump in level,
which is audible as a click. Both segments are floored at
`MIN_SEGMENT_SAMPLES` (40 samples, under a millisecond). The one exception
is a release with sustain 0: the voice is already silent, so the release
table collapses to a single zero sample.

Parameter Order
---------------

The decay slope and the release start both depend on the sustain level.
Changing sustain therefore recomputes BOTH tables, and `set_adsr` applies
sustain before attack/decay and release.

Rebuilding allocates. It belongs to the control path, never the audio
callback; see `synth::controller` for how rebuilt envelopes reach the
audio thread.
*/

/// Minimum decay and release length, in samples.
pub const MIN_SEGMENT_SAMPLES: usize = 40;

/// Convert milliseconds to a whole number of samples.
#[inline]
pub fn ms_to_samples(ms: u32, sample_rate: f32) -> usize {
    (ms as f32 * sample_rate / 1000.0) as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    sample_rate: f32,

    attack_ms: u32,
    decay_ms: u32,
    sustain: f32,
    release_ms: u32,

    attack_decay: Vec<f32>,
    release: Vec<f32>,
}

impl Envelope {
    /// Envelope with the default shape (10 ms, 44 ms, 0.3, 200 ms).
    pub fn new(sample_rate: f32) -> Self {
        Self::from_adsr(sample_rate, Adsr::default())
    }

    pub fn from_adsr(sample_rate: f32, adsr: Adsr) -> Self {
        let mut env = Self {
            sample_rate,
            attack_ms: adsr.attack_ms,
            decay_ms: adsr.decay_ms,
            sustain: adsr.sustain,
            release_ms: adsr.release_ms,
            attack_decay: Vec::new(),
            release: Vec::new(),
        };
        env.set_from(adsr);
        env
    }

    /// Set all four parameters. Sustain is applied first because the decay
    /// and release tables depend on it.
    pub fn set_adsr(&mut self, attack_ms: u32, decay_ms: u32, sustain: f32, release_ms: u32) {
        self.set_sustain(sustain);
        self.recompute_attack_decay(attack_ms, decay_ms);
        self.recompute_release(release_ms);
    }

    pub fn set_from(&mut self, adsr: Adsr) {
        self.set_adsr(adsr.attack_ms, adsr.decay_ms, adsr.sustain, adsr.release_ms);
    }

    pub fn adsr(&self) -> Adsr {
        Adsr {
            attack_ms: self.attack_ms,
            decay_ms: self.decay_ms,
            sustain: self.sustain,
            release_ms: self.release_ms,
        }
    }

    pub fn set_attack(&mut self, attack_ms: u32) {
        self.recompute_attack_decay(attack_ms, self.decay_ms);
    }

    pub fn set_decay(&mut self, decay_ms: u32) {
        self.recompute_attack_decay(self.attack_ms, decay_ms);
    }

    /// Set the sustain level (clamped to 0..=1). Recomputes the release and
    /// decay tables.
    pub fn set_sustain(&mut self, sustain: f32) {
        self.sustain = sustain.clamp(0.0, 1.0);
        self.recompute_release(self.release_ms);
        self.recompute_attack_decay(self.attack_ms, self.decay_ms);
    }

    pub fn set_release(&mut self, release_ms: u32) {
        self.recompute_release(release_ms);
    }

    /// Re-render both tables for a new sample rate, keeping the times in ms.
    pub fn rebuild_for_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_from(self.adsr());
    }

    pub fn recompute_attack_decay(&mut self, attack_ms: u32, decay_ms: u32) {
        self.attack_ms = attack_ms;
        self.decay_ms = decay_ms;

        let attack_samples = ms_to_samples(attack_ms, self.sample_rate).max(1);
        let decay_samples = ms_to_samples(decay_ms, self.sample_rate).max(MIN_SEGMENT_SAMPLES);

        self.attack_decay.clear();
        self.attack_decay.reserve(attack_samples + decay_samples);

        // Attack: 1/n, 2/n, ... 1.0
        let n = attack_samples as f32;
        self.attack_decay
            .extend((1..=attack_samples).map(|i| i as f32 / n));

        // Decay continues from the attack peak towards sustain
        let peak = self.attack_decay[attack_samples - 1];
        let decay_step = (1.0 - self.sustain) / decay_samples as f32;
        self.attack_decay
            .extend((1..=decay_samples).map(|i| peak - i as f32 * decay_step));
    }

    pub fn recompute_release(&mut self, release_ms: u32) {
        self.release_ms = release_ms;

        let release_samples = if self.sustain == 0.0 {
            1
        } else {
            ms_to_samples(release_ms, self.sample_rate).max(MIN_SEGMENT_SAMPLES)
        };

        let step = self.sustain / release_samples as f32;
        self.release.clear();
        self.release
            .extend((0..release_samples).map(|i| self.sustain - i as f32 * step));
    }

    /// Attack/decay level at `position`; the sustain level once past the table.
    #[inline]
    pub fn value_at_attack_decay(&self, position: usize) -> f32 {
        match self.attack_decay.get(position) {
            Some(&value) => value,
            None => self.sustain,
        }
    }

    /// Release level at `position`; 0 once past the table.
    #[inline]
    pub fn value_at_release(&self, position: usize) -> f32 {
        match self.release.get(position) {
            Some(&value) => value,
            None => 0.0,
        }
    }

    pub fn attack_decay_len(&self) -> usize {
        self.attack_decay.len()
    }

    pub fn release_len(&self) -> usize {
        self.release.len()
    }

    /// Combined length of both tables.
    pub fn len(&self) -> usize {
        self.attack_decay.len() + self.release.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attack_decay_table(&self) -> &[f32] {
        &self.attack_decay
    }

    pub fn release_table(&self) -> &[f32] {
        &self.release
    }

    pub fn attack_ms(&self) -> u32 {
        self.attack_ms
    }

    pub fn decay_ms(&self) -> u32 {
        self.decay_ms
    }

    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    pub fn release_ms(&self) -> u32 {
        self.release_ms
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
