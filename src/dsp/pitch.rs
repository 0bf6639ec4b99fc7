//! Equal-tempered pitch arithmetic.

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
///
/// Panics if `note` is outside the MIDI range (0-127).
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    assert!(note < 128, "MIDI note out of range: {note}");
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Lowest playable frequency (MIDI note 0, ~8.18 Hz).
///
/// Every waveform buffer holds exactly one cycle of this pitch.
#[inline]
pub fn lowest_freq() -> f32 {
    midi_note_to_freq(0)
}

/// Phase increment per sample for `note` when reading a fundamental-period
/// buffer: the ratio of the note's frequency to the lowest frequency.
#[inline]
pub fn note_step(note: u8) -> f32 {
    midi_note_to_freq(note) / lowest_freq()
}
