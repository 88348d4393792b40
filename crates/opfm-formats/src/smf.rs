//! SMF header and track chunk validation.

use std::ops::Range;

use binrw::io::Cursor;
use binrw::BinRead;

use crate::SmfError;

/// Bytes in the MThd chunk including its magic and length.
pub const HEADER_LEN: usize = 14;

/// Tracks beyond this count are ignored.
pub const MAX_TRACKS: usize = 16;

/// Microseconds per quarter note until a tempo event says otherwise.
pub const DEFAULT_TEMPO: u32 = 500_000;

const TRACK_HEADER_LEN: usize = 8;

#[derive(BinRead, Debug)]
#[br(big, magic = b"MThd")]
struct HeaderChunk {
    length: u32,
    format: u16,
    track_count: u16,
    division: u16,
}

#[derive(BinRead, Debug)]
#[br(big, magic = b"MTrk")]
struct TrackChunkHeader {
    length: u32,
}

/// Validated structure of an SMF buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmfLayout {
    /// 0 (single track) or 1 (simultaneous tracks)
    pub format: u16,
    /// Ticks per quarter note
    pub resolution: u16,
    /// Body byte range of each track, at most `MAX_TRACKS`.
    pub tracks: Vec<Range<usize>>,
}

impl SmfLayout {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

fn read_chunk<T>(bytes: &[u8], bad_magic: SmfError) -> Result<T, SmfError>
where
    T: BinRead + binrw::meta::ReadEndian,
    for<'a> T::Args<'a>: Default,
{
    T::read(&mut Cursor::new(bytes)).map_err(|e| match e {
        binrw::Error::BadMagic { .. } => bad_magic,
        _ => SmfError::UnexpectedEof,
    })
}

/// Validate the header and every declared track chunk of `data`.
///
/// Nothing is returned unless the whole structure checks out. Only the first
/// `MAX_TRACKS` tracks are validated; trailing bytes are ignored.
pub fn parse_smf(data: &[u8]) -> Result<SmfLayout, SmfError> {
    if data.len() < HEADER_LEN {
        return Err(SmfError::TooShort);
    }
    let header: HeaderChunk = read_chunk(&data[..HEADER_LEN], SmfError::BadHeaderMagic)?;
    if header.length != 6 {
        return Err(SmfError::BadHeaderLength(header.length));
    }
    if header.format >= 2 {
        return Err(SmfError::UnsupportedFormat(header.format));
    }

    let mut track_count = header.track_count as usize;
    if track_count > MAX_TRACKS {
        log::warn!("SMF declares {track_count} tracks, playing the first {MAX_TRACKS}");
        track_count = MAX_TRACKS;
    }

    let mut tracks = Vec::with_capacity(track_count);
    let mut pos = HEADER_LEN;
    for index in 0..track_count {
        let rest = &data[pos..];
        if rest.len() < TRACK_HEADER_LEN {
            return Err(SmfError::UnexpectedEof);
        }
        let chunk: TrackChunkHeader =
            read_chunk(&rest[..TRACK_HEADER_LEN], SmfError::BadTrackMagic { index })?;
        let start = pos + TRACK_HEADER_LEN;
        let available = data.len() - start;
        let length = chunk.length as usize;
        if length > available {
            return Err(SmfError::TruncatedTrack {
                index,
                declared: chunk.length,
                available,
            });
        }
        tracks.push(start..start + length);
        pos = start + length;
    }

    log::debug!(
        "parsed SMF: format {}, {} tracks, resolution {}",
        header.format,
        tracks.len(),
        header.division
    );
    Ok(SmfLayout {
        format: header.format,
        resolution: header.division,
        tracks,
    })
}
