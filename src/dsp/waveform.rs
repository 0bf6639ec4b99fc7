use crate::dsp::harmonics::HarmonicTable;

/// Single-cycle sample buffer built by summing weighted harmonics.
///
/// The buffer length is fixed at construction (one cycle of the lowest
/// pitch), so rebuilding never allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Box<[f32]>,
}

impl Waveform {
    /// Silent waveform of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len].into_boxed_slice(),
        }
    }

    /// Silent waveform sized for the given harmonic table.
    pub fn for_table(harmonics: &HarmonicTable) -> Self {
        Self::new(harmonics.period_len())
    }

    /// Rebuild the buffer from harmonic `levels` (each in -1..=1).
    ///
    /// Returns `true` if any level was nonzero, i.e. the waveform is audible.
    /// Panics if `levels` names more harmonics than the table holds.
    pub fn rebuild(&mut self, levels: &[f32], harmonics: &HarmonicTable) -> bool {
        assert!(
            levels.len() <= harmonics.len(),
            "{} levels for {} harmonics",
            levels.len(),
            harmonics.len()
        );

        self.clear();
        let mut audible = false;
        for (index, &level) in levels.iter().enumerate() {
            if level != 0.0 {
                self.add_harmonic(harmonics.harmonic(index), level);
                audible = true;
            }
        }
        self.normalize();

        audible
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Mix `harmonic * level` into the buffer. A shorter harmonic only
    /// touches the head of the buffer; a longer one is truncated.
    pub fn add_harmonic(&mut self, harmonic: &[f32], level: f32) {
        for (sample, h) in self.samples.iter_mut().zip(harmonic) {
            *sample += h * level;
        }
    }

    /// Scale so the peak magnitude is exactly 1.0. An all-zero buffer is
    /// left untouched.
    pub fn normalize(&mut self) {
        let peak = self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak != 0.0 {
            for sample in self.samples.iter_mut() {
                *sample /= peak;
            }
        }
    }

    /// Read at a fractional `position` with linear interpolation.
    ///
    /// `position` must lie in `[0, len)`. Between the last sample and the end
    /// of the buffer the read wraps to sample 0.
    #[inline]
    pub fn interpolated_sample(&self, position: f32) -> f32 {
        let x1 = position as usize;
        let x2 = (x1 + 1) as f32;

        let y1 = self.samples[x1];
        let y2 = match self.samples.get(x1 + 1) {
            Some(&next) => next,
            None => self.samples[0],
        };

        (position - x1 as f32) * y2 + (x2 - position) * y1
    }

    pub fn sample(&self, index: usize) -> f32 {
        self.samples[index]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw samples, for plotting.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Peak magnitude of the buffer.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}
