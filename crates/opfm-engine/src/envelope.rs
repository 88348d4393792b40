//! Per-operator envelope generator.
//!
//! Phases run in a fixed forward order. Each phase with a zero length is
//! skipped, and note-off jumps to `Release` (or straight to `End` when the
//! envelope is already silent).

use opfm_ir::{EnvelopeKeyframe, EnvelopeTable, NoteNumber, BLOCK_SIZE, SAMPLE_RATE};

/// Envelope phase, in forward order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvelopePhase {
    Delay,
    Attack1,
    Attack2,
    Hold,
    Decay1,
    Decay2,
    Sustain,
    Release,
    End,
}

impl EnvelopePhase {
    /// Phases reachable without a note-off, in the order they are tried.
    const FORWARD: [EnvelopePhase; 7] = [
        EnvelopePhase::Delay,
        EnvelopePhase::Attack1,
        EnvelopePhase::Attack2,
        EnvelopePhase::Hold,
        EnvelopePhase::Decay1,
        EnvelopePhase::Decay2,
        EnvelopePhase::Sustain,
    ];
}

/// Runtime state of one operator's envelope for one note.
#[derive(Clone, Debug)]
pub struct Envelope {
    config: EnvelopeKeyframe,
    phase: EnvelopePhase,
    level: f32,
    /// Samples spent in the current phase, saturating.
    elapsed: u32,
    attack1_tangent: f32,
    attack2_tangent: f32,
    decay1_tangent: f32,
    decay2_tangent: f32,
    release_tangent: f32,
}

impl Envelope {
    /// Build the envelope for `note` from an operator's keyframe table.
    pub fn new(table: &EnvelopeTable, note: NoteNumber) -> Self {
        Self::from_keyframe(table.at(note).unwrap_or_default())
    }

    /// Build an envelope from an already resolved keyframe.
    pub fn from_keyframe(config: EnvelopeKeyframe) -> Self {
        let sr = SAMPLE_RATE as f32;
        let mut envelope = Self {
            attack1_tangent: config.attack_mid_level / (config.attack1_length * sr),
            attack2_tangent: (1.0 - config.attack_mid_level) / (config.attack2_length * sr),
            decay1_tangent: -(1.0 - config.decay_mid_level) / (config.decay1_length * sr),
            decay2_tangent: -(config.decay_mid_level - config.sustain_level)
                / (config.decay2_length * sr),
            release_tangent: -1.0 / (config.release_length * sr),
            config,
            phase: EnvelopePhase::End,
            level: 0.0,
            elapsed: 0,
        };
        envelope.enter_from(EnvelopePhase::Delay);
        envelope
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    /// Level the next rendered sample starts from.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_end(&self) -> bool {
        self.phase == EnvelopePhase::End
    }

    /// Gate off. A silent envelope ends immediately without a release.
    pub fn note_off(&mut self) {
        if self.level != 0.0 && self.config.release_length > 0.0 {
            self.phase = EnvelopePhase::Release;
        } else {
            self.phase = EnvelopePhase::End;
            self.level = 0.0;
        }
        self.elapsed = 0;
    }

    /// Render one block of envelope levels into `out`.
    pub fn advance(&mut self, out: &mut [f32; BLOCK_SIZE]) {
        match self.phase {
            EnvelopePhase::Delay => {
                out.fill(0.0);
                self.elapsed = self.elapsed.saturating_add(BLOCK_SIZE as u32);
                if self.exceeded(self.config.delay_length) {
                    self.enter_from(EnvelopePhase::Attack1);
                }
            }
            EnvelopePhase::Attack1 => {
                let target = self.config.attack_mid_level;
                self.ramp(out, self.attack1_tangent, 0.0, 1.0, target);
                if self.exceeded(self.config.attack1_length) {
                    self.enter_from(EnvelopePhase::Attack2);
                }
            }
            EnvelopePhase::Attack2 => {
                self.ramp(out, self.attack2_tangent, 0.0, 1.0, 1.0);
                if self.exceeded(self.config.attack2_length) {
                    self.enter_from(EnvelopePhase::Hold);
                }
            }
            EnvelopePhase::Hold => {
                out.fill(self.level);
                self.elapsed = self.elapsed.saturating_add(BLOCK_SIZE as u32);
                if self.exceeded(self.config.hold_length) {
                    self.enter_from(EnvelopePhase::Decay1);
                }
            }
            EnvelopePhase::Decay1 => {
                let floor = self.config.decay_mid_level;
                self.ramp(out, self.decay1_tangent, floor, 1.0, floor);
                if self.exceeded(self.config.decay1_length) {
                    self.enter_from(EnvelopePhase::Decay2);
                }
            }
            EnvelopePhase::Decay2 => {
                let floor = self.config.sustain_level;
                self.ramp(out, self.decay2_tangent, floor, 1.0, floor);
                if self.exceeded(self.config.decay2_length) {
                    self.enter_from(EnvelopePhase::Sustain);
                }
            }
            EnvelopePhase::Sustain => out.fill(self.level),
            EnvelopePhase::Release => {
                self.ramp(out, self.release_tangent, 0.0, 1.0, 0.0);
                if self.level <= 0.0 || self.exceeded(self.config.release_length) {
                    self.phase = EnvelopePhase::End;
                    self.level = 0.0;
                    self.elapsed = 0;
                }
            }
            EnvelopePhase::End => out.fill(0.0),
        }
    }

    /// Emit the current level per sample, then step it by `tangent` and
    /// clamp into `[lo, hi]`. A non-finite step lands on `fallback`.
    fn ramp(&mut self, out: &mut [f32; BLOCK_SIZE], tangent: f32, lo: f32, hi: f32, fallback: f32) {
        for sample in out.iter_mut() {
            *sample = self.level;
            let next = self.level + tangent;
            self.level = if next.is_finite() { next.max(lo).min(hi) } else { fallback };
        }
        self.elapsed = self.elapsed.saturating_add(BLOCK_SIZE as u32);
    }

    /// Whether the current phase has run longer than `length` seconds.
    fn exceeded(&self, length: f32) -> bool {
        self.elapsed as f32 > length * SAMPLE_RATE as f32
    }

    /// Move to the first present phase at or after `start`, taking that
    /// phase's entry level, or to `End` when none is left.
    fn enter_from(&mut self, start: EnvelopePhase) {
        self.elapsed = 0;
        let next = EnvelopePhase::FORWARD
            .iter()
            .copied()
            .filter(|&phase| phase >= start)
            .find(|&phase| self.is_present(phase));
        match next {
            Some(phase) => {
                self.phase = phase;
                self.level = self.entry_level(phase);
            }
            None => {
                self.phase = EnvelopePhase::End;
                self.level = 0.0;
            }
        }
    }

    fn is_present(&self, phase: EnvelopePhase) -> bool {
        let c = &self.config;
        match phase {
            EnvelopePhase::Delay => c.delay_length > 0.0,
            EnvelopePhase::Attack1 => c.attack1_length > 0.0,
            EnvelopePhase::Attack2 => c.attack2_length > 0.0,
            EnvelopePhase::Hold => c.hold_length > 0.0,
            EnvelopePhase::Decay1 => c.decay1_length > 0.0,
            EnvelopePhase::Decay2 => c.decay2_length > 0.0,
            EnvelopePhase::Sustain => c.sustain_level > 0.0,
            EnvelopePhase::Release => c.release_length > 0.0,
            EnvelopePhase::End => true,
        }
    }

    fn entry_level(&self, phase: EnvelopePhase) -> f32 {
        match phase {
            EnvelopePhase::Delay | EnvelopePhase::Attack1 => 0.0,
            EnvelopePhase::Attack2 => self.config.attack_mid_level,
            EnvelopePhase::Hold | EnvelopePhase::Decay1 => 1.0,
            EnvelopePhase::Decay2 => self.config.decay_mid_level,
            EnvelopePhase::Sustain => self.config.sustain_level,
            EnvelopePhase::Release | EnvelopePhase::End => self.level,
        }
    }
}
