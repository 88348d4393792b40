//! FM synthesis engine for the opfm synthesizer.
//!
//! Turns MIDI bytes into mono audio blocks: `MidiPlayer` decodes messages,
//! `ChannelMixer` owns one `VoicePool` per channel, and each `Voice` runs an
//! N-operator phase-modulation network shaped by per-operator envelopes.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod envelope;
mod frequency;
mod limiter;
mod midi;
mod mixer;
mod voice;
mod voice_pool;

pub use channel::ChannelState;
pub use envelope::{Envelope, EnvelopePhase};
pub use frequency::{note_to_frequency, note_to_increment};
pub use limiter::{Limiter, HOLD_SAMPLES, LIMIT};
pub use midi::{Controller, MessageState, MidiPlayer, NoteOffMode, MUTED_CHANNEL, NOTE_OFFSET};
pub use mixer::{ChannelMixer, CHANNEL_GAIN};
pub use voice::Voice;
pub use voice_pool::VoicePool;
