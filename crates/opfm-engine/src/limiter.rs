//! Output limiter with a fast attack and slow recovery.

use opfm_ir::{AudioBlock, BLOCK_SIZE, SAMPLE_RATE};

/// Output ceiling and resting gain.
pub const LIMIT: f32 = 0.8;

/// Samples to hold the reduced gain after a breach before recovering.
pub const HOLD_SAMPLES: u32 = 1000;

/// Gain regained per sample while recovering.
const RECOVERY_STEP: f32 = 1.0 / SAMPLE_RATE as f32;

/// Soft limiter applied to the mixed output block.
#[derive(Clone, Debug)]
pub struct Limiter {
    scale: f32,
    cooldown: u32,
    /// Gain applied to each sample of the last processed block.
    gains: [f32; BLOCK_SIZE],
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Limiter {
    pub fn new() -> Self {
        Self {
            scale: LIMIT,
            cooldown: 0,
            gains: [LIMIT; BLOCK_SIZE],
        }
    }

    /// Current gain.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Per-sample gains applied by the last `process` call.
    pub fn last_gains(&self) -> &[f32; BLOCK_SIZE] {
        &self.gains
    }

    /// Limit `block` in place.
    ///
    /// A sample that would exceed the ceiling drops the gain to exactly fit it
    /// and ramps the gains of the samples since the previous breach in this
    /// block from the gain just before the breach down to the new value. A
    /// ramped gain is never higher than the gain that sample already had.
    pub fn process(&mut self, block: &mut AudioBlock) {
        let samples = block.samples_mut();
        let mut ramp_start = 0;

        for i in 0..BLOCK_SIZE {
            if !samples[i].is_finite() {
                samples[i] = 0.0;
            }
            let magnitude = libm::fabsf(samples[i]);
            if magnitude * self.scale > LIMIT {
                let before = self.scale;
                self.scale = LIMIT / magnitude;
                let span = (i - ramp_start) as f32;
                for j in ramp_start..i {
                    let t = (j - ramp_start) as f32 / span;
                    let ramped = before * (1.0 - t) + self.scale * t;
                    self.gains[j] = self.gains[j].min(ramped);
                }
                self.cooldown = HOLD_SAMPLES;
                ramp_start = i + 1;
            } else if self.cooldown > 0 {
                self.cooldown -= 1;
            } else if self.scale < LIMIT {
                self.scale = (self.scale + RECOVERY_STEP).min(LIMIT);
            }
            self.gains[i] = self.scale;
        }

        for (sample, gain) in samples.iter_mut().zip(self.gains.iter()) {
            *sample *= gain;
        }
    }
}
