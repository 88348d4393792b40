//! Core parameter and audio block types for the opfm synthesizer.
//!
//! This crate defines the data shared by every other crate: the fixed
//! block/sample-rate constants, the mono `AudioBlock`, and the immutable
//! `FmParams` object that describes an instrument. Parameter loading lives
//! outside the workspace; the engine only consumes a finished `FmParams`.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_block;
mod envelope;
mod params;
mod table;
mod weights;

pub use audio_block::{AudioBlock, BLOCK_DURATION_MS, BLOCK_SIZE, SAMPLE_RATE};
pub use envelope::EnvelopeKeyframe;
pub use params::{EnvelopeTable, FmParams, ParamError, WeightTable};
pub use table::{lerp, Lerp, NoteTable};
pub use weights::WeightKeyframe;

/// MIDI note number (0-127 for sounding notes).
pub type NoteNumber = u8;

/// MIDI velocity.
pub type Velocity = u8;

/// MIDI channel index (0-15).
pub type ChannelIndex = u8;

/// Number of distinct note numbers a voice pool can hold.
pub const MAX_NOTE_NUMBER: usize = 128;

/// Largest operator network a voice can render.
pub const MAX_OPERATORS: usize = 8;

/// Number of MIDI channels.
pub const CHANNEL_COUNT: usize = 16;
