//! Fixed-size mono f32 audio block.

/// Samples per rendered block.
pub const BLOCK_SIZE: usize = 32;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44100;

/// Duration of one block in milliseconds.
pub const BLOCK_DURATION_MS: f32 = BLOCK_SIZE as f32 / SAMPLE_RATE as f32 * 1000.0;

/// One block of mono audio.
///
/// Every render call in the engine produces exactly one block; there is no
/// partial-block rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBlock {
    data: [f32; BLOCK_SIZE],
}

impl AudioBlock {
    /// Create a silent block.
    pub const fn new() -> Self {
        Self { data: [0.0; BLOCK_SIZE] }
    }

    /// Create a block from raw samples.
    pub const fn from_samples(data: [f32; BLOCK_SIZE]) -> Self {
        Self { data }
    }

    /// Fill all samples with zero.
    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Read-only access to the samples.
    pub fn samples(&self) -> &[f32; BLOCK_SIZE] {
        &self.data
    }

    /// Mutable access to the samples.
    pub fn samples_mut(&mut self) -> &mut [f32; BLOCK_SIZE] {
        &mut self.data
    }

    /// Sum `source` into this block.
    pub fn mix_from(&mut self, source: &AudioBlock) {
        for (dst, src) in self.data.iter_mut().zip(source.data.iter()) {
            *dst += *src;
        }
    }

    /// Sum `source` into this block with gain.
    pub fn mix_from_scaled(&mut self, source: &AudioBlock, gain: f32) {
        for (dst, src) in self.data.iter_mut().zip(source.data.iter()) {
            *dst += *src * gain;
        }
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, &s| m.max(libm::fabsf(s)))
    }
}

impl Default for AudioBlock {
    fn default() -> Self {
        Self::new()
    }
}
