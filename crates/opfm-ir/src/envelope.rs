//! Envelope keyframes.

use crate::table::{lerp, Lerp};

/// Shape of one operator's amplitude envelope at a given note.
///
/// Lengths are in seconds, levels are normalized to [0, 1]. A length of 0
/// removes that phase from the envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvelopeKeyframe {
    pub delay_length: f32,
    pub attack1_length: f32,
    pub attack2_length: f32,
    /// Level reached at the end of attack1.
    pub attack_mid_level: f32,
    pub hold_length: f32,
    pub decay1_length: f32,
    pub decay2_length: f32,
    /// Level reached at the end of decay1.
    pub decay_mid_level: f32,
    pub sustain_level: f32,
    pub release_length: f32,
}

impl EnvelopeKeyframe {
    /// A keyframe that sits at `level` from the first sample until note-off.
    pub fn sustained(level: f32) -> Self {
        Self { decay_mid_level: level, sustain_level: level, ..Self::default() }
    }

    /// The level and length fields, by name, for validation and reporting.
    pub(crate) fn lengths(&self) -> [(&'static str, f32); 6] {
        [
            ("delay", self.delay_length),
            ("attack1", self.attack1_length),
            ("attack2", self.attack2_length),
            ("hold", self.hold_length),
            ("decay1", self.decay1_length),
            ("decay2", self.decay2_length),
        ]
    }

    pub(crate) fn levels(&self) -> [(&'static str, f32); 3] {
        [
            ("attack_mid_level", self.attack_mid_level),
            ("decay_mid_level", self.decay_mid_level),
            ("sustain_level", self.sustain_level),
        ]
    }
}

impl Default for EnvelopeKeyframe {
    fn default() -> Self {
        Self {
            delay_length: 0.0,
            attack1_length: 0.0,
            attack2_length: 0.0,
            attack_mid_level: 0.0,
            hold_length: 0.0,
            decay1_length: 0.0,
            decay2_length: 0.0,
            decay_mid_level: 1.0,
            sustain_level: 1.0,
            release_length: 0.0,
        }
    }
}

impl Lerp for EnvelopeKeyframe {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            delay_length: lerp(self.delay_length, other.delay_length, t),
            attack1_length: lerp(self.attack1_length, other.attack1_length, t),
            attack2_length: lerp(self.attack2_length, other.attack2_length, t),
            attack_mid_level: lerp(self.attack_mid_level, other.attack_mid_level, t),
            hold_length: lerp(self.hold_length, other.hold_length, t),
            decay1_length: lerp(self.decay1_length, other.decay1_length, t),
            decay2_length: lerp(self.decay2_length, other.decay2_length, t),
            decay_mid_level: lerp(self.decay_mid_level, other.decay_mid_level, t),
            sustain_level: lerp(self.sustain_level, other.sustain_level, t),
            release_length: lerp(self.release_length, other.release_length, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_full_sustain() {
        let kf = EnvelopeKeyframe::default();
        assert_eq!(kf.sustain_level, 1.0);
        assert_eq!(kf.decay_mid_level, 1.0);
        assert_eq!(kf.attack1_length, 0.0);
    }

    #[test]
    fn lerp_blends_every_field() {
        let lo = EnvelopeKeyframe {
            delay_length: 0.0,
            attack1_length: 0.1,
            attack2_length: 0.2,
            attack_mid_level: 0.2,
            hold_length: 0.0,
            decay1_length: 1.0,
            decay2_length: 2.0,
            decay_mid_level: 0.6,
            sustain_level: 0.4,
            release_length: 0.5,
        };
        let hi = EnvelopeKeyframe {
            delay_length: 1.0,
            attack1_length: 0.3,
            attack2_length: 0.4,
            attack_mid_level: 0.6,
            hold_length: 1.0,
            decay1_length: 3.0,
            decay2_length: 4.0,
            decay_mid_level: 1.0,
            sustain_level: 0.0,
            release_length: 1.5,
        };
        let mid = lo.lerp(&hi, 0.5);
        assert!((mid.delay_length - 0.5).abs() < 1e-6);
        assert!((mid.attack1_length - 0.2).abs() < 1e-6);
        assert!((mid.attack2_length - 0.3).abs() < 1e-6);
        assert!((mid.attack_mid_level - 0.4).abs() < 1e-6);
        assert!((mid.hold_length - 0.5).abs() < 1e-6);
        assert!((mid.decay1_length - 2.0).abs() < 1e-6);
        assert!((mid.decay2_length - 3.0).abs() < 1e-6);
        assert!((mid.decay_mid_level - 0.8).abs() < 1e-6);
        assert!((mid.sustain_level - 0.2).abs() < 1e-6);
        assert!((mid.release_length - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sustained_keyframe_has_no_timed_phases() {
        let kf = EnvelopeKeyframe::sustained(0.5);
        assert!(kf.lengths().iter().all(|&(_, v)| v == 0.0));
        assert_eq!(kf.sustain_level, 0.5);
    }
}
