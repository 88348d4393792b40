//! Headless SMF playback for the opfm synthesizer.
//!
//! Provides the file sequencer that turns a loaded Standard MIDI File into
//! audio blocks, plus offline render helpers that collect samples in memory.

mod render;
mod sequencer;

// Re-export common types so callers don't need opfm-ir/opfm-engine directly.
pub use opfm_engine::{MidiPlayer, NoteOffMode};
pub use opfm_formats::SmfError;
pub use opfm_ir::{AudioBlock, FmParams, BLOCK_SIZE, SAMPLE_RATE};

pub use render::{render_note, render_sequence};
pub use sequencer::{Sequencer, TempoState, TrackSequencer};
