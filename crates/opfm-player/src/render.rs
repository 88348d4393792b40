//! Offline rendering into memory.

use opfm_engine::Voice;
use opfm_ir::{AudioBlock, FmParams, NoteNumber, Velocity, BLOCK_SIZE};

use crate::sequencer::Sequencer;

/// Render a single voice, ignoring mixer gain and limiting.
///
/// Stops after the block in which the voice ends, or after `max_blocks`.
pub fn render_note(
    params: &FmParams,
    note: NoteNumber,
    velocity: Velocity,
    max_blocks: usize,
) -> Vec<f32> {
    let mut voice = Voice::new(params, note, velocity);
    let mut block = AudioBlock::new();
    let mut samples = Vec::with_capacity(max_blocks * BLOCK_SIZE);
    for _ in 0..max_blocks {
        voice.render(&mut block);
        samples.extend_from_slice(block.samples());
        if voice.is_end() {
            break;
        }
    }
    samples
}

/// Render `sequencer` until every track has ended, or for `max_blocks`.
pub fn render_sequence(sequencer: &mut Sequencer, max_blocks: usize) -> Vec<f32> {
    let mut block = AudioBlock::new();
    let mut samples = Vec::new();
    let mut blocks = 0;
    while !sequencer.is_end() && blocks < max_blocks {
        sequencer.render(&mut block);
        samples.extend_from_slice(block.samples());
        blocks += 1;
    }
    samples
}
