//! Note-to-frequency conversion for operator oscillators.

use core::f32::consts::TAU;

use opfm_ir::{NoteNumber, SAMPLE_RATE};

/// Frequency in Hz of `note`.
///
/// Equal temperament anchored at 6.875 Hz with a three-semitone offset, so
/// note 69 lands on 440 Hz.
pub fn note_to_frequency(note: NoteNumber) -> f32 {
    libm::exp2f((note as f32 + 3.0) / 12.0) * 6.875
}

/// Per-sample phase increment, in radians, of an operator running at
/// `ratio` times the frequency of `note`.
pub fn note_to_increment(note: NoteNumber, ratio: f32) -> f32 {
    TAU * ratio * note_to_frequency(note) / SAMPLE_RATE as f32
}
