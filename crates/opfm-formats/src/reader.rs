//! Bounds-checked cursor over one MTrk body.

/// Meta event type ending a track.
pub const META_END_OF_TRACK: u8 = 0x2F;

/// Meta event type carrying microseconds per quarter note.
pub const META_TEMPO: u8 = 0x51;

/// An event head read from a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackEvent {
    /// System exclusive message; its payload has been skipped.
    SysEx,
    /// End-of-track meta event. The reader is left at the end of the track.
    EndOfTrack,
    /// Set-tempo meta event, microseconds per quarter note.
    Tempo(u32),
    /// Any other meta event; its payload has been skipped.
    Meta(u8),
    /// Channel message head. The remaining bytes belong to the MIDI decoder
    /// and are read with `read_u8`. Below 0x80 this is a running-status data
    /// byte.
    Midi(u8),
}

/// Reads delta-times and events from a track body.
///
/// Every read is checked against the end of the track. Reads that run out
/// of bytes move the cursor to the end so the track reports finished.
#[derive(Debug)]
pub struct TrackReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> TrackReader<'a> {
    /// Reader over `data[pos..end]`, with `end` clamped to `data`.
    pub fn new(data: &'a [u8], pos: usize, end: usize) -> Self {
        let end = end.min(data.len());
        Self {
            data,
            pos: pos.min(end),
            end,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        if self.pos >= self.end {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    /// Variable-length quantity: 7 bits per byte, high bit set on all but the
    /// last byte. `None` if the track ends before the last byte.
    pub fn read_vlq(&mut self) -> Option<u32> {
        let mut value = 0u32;
        loop {
            let Some(byte) = self.read_u8() else {
                log::warn!("track truncated inside a variable-length quantity");
                return None;
            };
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Some(value);
            }
        }
    }

    /// Skip `n` bytes. Returns false, leaving the cursor at the end, if fewer
    /// remain.
    pub fn skip(&mut self, n: usize) -> bool {
        if n > self.remaining() {
            self.pos = self.end;
            return false;
        }
        self.pos += n;
        true
    }

    /// Jump to the end of the track.
    pub fn finish(&mut self) {
        self.pos = self.end;
    }

    /// Read the next event head, consuming sysex and meta payloads.
    pub fn read_event(&mut self) -> Option<TrackEvent> {
        let status = self.read_u8()?;
        match status {
            0xF0 | 0xF7 => {
                let length = self.read_vlq()?;
                if !self.skip(length as usize) {
                    log::warn!("sysex of {length} bytes runs past the end of its track");
                }
                Some(TrackEvent::SysEx)
            }
            0xFF => self.read_meta(),
            _ => Some(TrackEvent::Midi(status)),
        }
    }

    fn read_meta(&mut self) -> Option<TrackEvent> {
        let kind = self.read_u8()?;
        if kind == META_END_OF_TRACK {
            self.finish();
            return Some(TrackEvent::EndOfTrack);
        }
        let length = self.read_vlq()?;
        if kind == META_TEMPO && length == 3 && self.remaining() >= 3 {
            let b = &self.data[self.pos..self.pos + 3];
            let tempo = (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32;
            self.pos += 3;
            return Some(TrackEvent::Tempo(tempo));
        }
        if !self.skip(length as usize) {
            log::warn!("meta event {kind:#04x} runs past the end of its track");
        }
        Some(TrackEvent::Meta(kind))
    }
}
