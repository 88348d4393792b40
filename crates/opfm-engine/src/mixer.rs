//! ChannelMixer: sixteen voice pools summed into one limited output block.

use alloc::sync::Arc;
use alloc::vec::Vec;
use opfm_ir::{AudioBlock, ChannelIndex, FmParams, NoteNumber, Velocity, CHANNEL_COUNT};

use crate::limiter::Limiter;
use crate::voice_pool::VoicePool;

/// Fixed gain applied to each channel before summing.
pub const CHANNEL_GAIN: f32 = 0.125;

/// Sums the voice pools of all MIDI channels and limits the result.
pub struct ChannelMixer {
    /// One pool per MIDI channel
    pools: Vec<VoicePool>,
    limiter: Limiter,
    /// Per-channel render target
    scratch: AudioBlock,
}

impl ChannelMixer {
    pub fn new(params: Arc<FmParams>) -> Self {
        Self {
            pools: (0..CHANNEL_COUNT)
                .map(|_| VoicePool::new(Arc::clone(&params)))
                .collect(),
            limiter: Limiter::new(),
            scratch: AudioBlock::new(),
        }
    }

    pub fn note_on(&mut self, channel: ChannelIndex, note: NoteNumber, velocity: Velocity) {
        if let Some(pool) = self.pools.get_mut(channel as usize) {
            pool.note_on(note, velocity);
        }
    }

    pub fn note_off(&mut self, channel: ChannelIndex, note: NoteNumber) {
        if let Some(pool) = self.pools.get_mut(channel as usize) {
            pool.note_off(note);
        }
    }

    pub fn release(&mut self, channel: ChannelIndex, note: NoteNumber) {
        if let Some(pool) = self.pools.get_mut(channel as usize) {
            pool.release(note);
        }
    }

    /// The voice pool of `channel`.
    pub fn pool(&self, channel: ChannelIndex) -> Option<&VoicePool> {
        self.pools.get(channel as usize)
    }

    /// Number of sounding voices across every channel.
    pub fn active_count(&self) -> usize {
        self.pools.iter().map(VoicePool::active_count).sum()
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Render one block of all channels into `out`.
    pub fn render(&mut self, out: &mut AudioBlock) {
        out.silence();
        for pool in &mut self.pools {
            pool.render(&mut self.scratch);
            out.mix_from_scaled(&self.scratch, CHANNEL_GAIN);
        }
        self.limiter.process(out);
    }

    /// Drop every voice on every channel. The limiter keeps its gain.
    pub fn reset(&mut self) {
        for pool in &mut self.pools {
            pool.reset();
        }
    }
}
