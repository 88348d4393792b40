//! Standard MIDI File decoding for the opfm synthesizer.
//!
//! `parse_smf` validates the chunk structure of a whole file up front and
//! returns the byte range of every track. `TrackReader` then walks a single
//! track body: delta-times, sysex, meta and channel events. Track bodies are
//! decoded leniently; running out of bytes ends the track instead of failing.

mod reader;
mod smf;

pub use reader::{TrackEvent, TrackReader, META_END_OF_TRACK, META_TEMPO};
pub use smf::{parse_smf, SmfLayout, DEFAULT_TEMPO, HEADER_LEN, MAX_TRACKS};

use thiserror::Error;

/// Structural error in an SMF buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmfError {
    #[error("buffer shorter than the 14-byte MThd header")]
    TooShort,
    #[error("missing MThd header magic")]
    BadHeaderMagic,
    #[error("MThd length is {0}, expected 6")]
    BadHeaderLength(u32),
    #[error("unsupported SMF format {0}")]
    UnsupportedFormat(u16),
    #[error("track {index}: missing MTrk magic")]
    BadTrackMagic { index: usize },
    #[error("track {index}: declared {declared} bytes, only {available} available")]
    TruncatedTrack {
        index: usize,
        declared: u32,
        available: usize,
    },
    #[error("unexpected end of data")]
    UnexpectedEof,
}
