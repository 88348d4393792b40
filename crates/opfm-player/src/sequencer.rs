//! File sequencer: schedules SMF track events against rendered audio time.

use std::ops::Range;
use std::sync::Arc;

use opfm_engine::MidiPlayer;
use opfm_formats::{parse_smf, SmfError, TrackEvent, TrackReader, DEFAULT_TEMPO};
use opfm_ir::{AudioBlock, FmParams, BLOCK_DURATION_MS};

/// Resolution assumed before any file is loaded.
const DEFAULT_RESOLUTION: u16 = 480;

/// Tempo shared by every track of a file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoState {
    /// Ticks per quarter note
    pub resolution: u16,
    /// Ticks per millisecond at the current tempo
    pub ms_to_delta_time: f32,
}

impl TempoState {
    pub fn new(resolution: u16) -> Self {
        let mut tempo = Self {
            resolution,
            ms_to_delta_time: 0.0,
        };
        tempo.set_tempo(DEFAULT_TEMPO);
        tempo
    }

    /// Apply a set-tempo event. A zero tempo is ignored.
    pub fn set_tempo(&mut self, micros_per_quarter: u32) {
        if micros_per_quarter == 0 {
            log::warn!("ignoring zero tempo");
            return;
        }
        self.ms_to_delta_time = self.resolution as f32 * 1000.0 / micros_per_quarter as f32;
        log::trace!(
            "tempo {micros_per_quarter} us/quarter, {} ticks/ms",
            self.ms_to_delta_time
        );
    }
}

impl Default for TempoState {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

/// Playback cursor over one track's byte range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackSequencer {
    pos: usize,
    end: usize,
    /// Absolute tick of the next event; `None` once the track has no more.
    next_tick: Option<u32>,
}

impl TrackSequencer {
    /// Position at the start of `range` and read the first delta-time.
    pub fn new(data: &[u8], range: Range<usize>) -> Self {
        let mut reader = TrackReader::new(data, range.start, range.end);
        let next_tick = next_delta(&mut reader);
        Self {
            pos: reader.position(),
            end: range.end,
            next_tick,
        }
    }

    pub fn next_tick(&self) -> Option<u32> {
        self.next_tick
    }

    pub fn is_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Dispatch every event scheduled at or before `now`.
    pub fn process(
        &mut self,
        now: f64,
        data: &[u8],
        player: &mut MidiPlayer,
        tempo: &mut TempoState,
    ) {
        let mut reader = TrackReader::new(data, self.pos, self.end);
        while let Some(tick) = self.next_tick {
            if tick as f64 > now {
                break;
            }
            dispatch(&mut reader, player, tempo);
            self.next_tick = next_delta(&mut reader).map(|delta| tick.saturating_add(delta));
        }
        self.pos = reader.position();
    }
}

fn next_delta(reader: &mut TrackReader<'_>) -> Option<u32> {
    if reader.is_at_end() {
        return None;
    }
    reader.read_vlq()
}

fn dispatch(reader: &mut TrackReader<'_>, player: &mut MidiPlayer, tempo: &mut TempoState) {
    match reader.read_event() {
        Some(TrackEvent::Midi(head)) => {
            if player.event(head) {
                return;
            }
            while let Some(byte) = reader.read_u8() {
                if player.event(byte) {
                    break;
                }
            }
        }
        Some(TrackEvent::Tempo(micros)) => tempo.set_tempo(micros),
        Some(TrackEvent::EndOfTrack) => log::trace!("end of track"),
        Some(TrackEvent::SysEx) | Some(TrackEvent::Meta(_)) | None => {}
    }
}

/// Plays a Standard MIDI File through a `MidiPlayer`, one block per call.
pub struct Sequencer {
    player: MidiPlayer,
    data: Vec<u8>,
    tracks: Vec<TrackSequencer>,
    tempo: TempoState,
    /// Playback position in ticks.
    now: f64,
}

impl Sequencer {
    pub fn new(params: Arc<FmParams>) -> Self {
        Self::with_player(MidiPlayer::new(params))
    }

    /// Sequence into an already configured player.
    pub fn with_player(player: MidiPlayer) -> Self {
        Self {
            player,
            data: Vec::new(),
            tracks: Vec::new(),
            tempo: TempoState::default(),
            now: 0.0,
        }
    }

    /// Load an SMF image and rewind to its start.
    ///
    /// The whole structure is validated first; on error the sequencer keeps
    /// whatever it was playing before.
    pub fn load(&mut self, data: impl Into<Vec<u8>>) -> Result<(), SmfError> {
        let data = data.into();
        let layout = parse_smf(&data)?;
        self.tracks = layout
            .tracks
            .iter()
            .map(|range| TrackSequencer::new(&data, range.clone()))
            .collect();
        self.tempo = TempoState::new(layout.resolution);
        self.now = 0.0;
        self.data = data;
        log::debug!(
            "loaded {} bytes, {} tracks",
            self.data.len(),
            self.tracks.len()
        );
        Ok(())
    }

    /// Dispatch due events, render one block, then advance the clock.
    pub fn render(&mut self, out: &mut AudioBlock) {
        for track in &mut self.tracks {
            track.process(self.now, &self.data, &mut self.player, &mut self.tempo);
        }
        self.player.render(out);
        self.now += BLOCK_DURATION_MS as f64 * self.tempo.ms_to_delta_time as f64;
    }

    /// True once every track has been read to the end.
    pub fn is_end(&self) -> bool {
        self.tracks.iter().all(TrackSequencer::is_end)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[TrackSequencer] {
        &self.tracks
    }

    pub fn resolution(&self) -> u16 {
        self.tempo.resolution
    }

    pub fn ms_to_delta_time(&self) -> f32 {
        self.tempo.ms_to_delta_time
    }

    /// Current position in ticks.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn player(&self) -> &MidiPlayer {
        &self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tempo() {
        let tempo = TempoState::new(480);
        assert_eq!(tempo.ms_to_delta_time, 480.0 * 1000.0 / 500_000.0);
    }

    #[test]
    fn zero_tempo_is_ignored() {
        let mut tempo = TempoState::new(96);
        let before = tempo.ms_to_delta_time;
        tempo.set_tempo(0);
        assert_eq!(tempo.ms_to_delta_time, before);
    }

    #[test]
    fn track_reads_first_delta() {
        let data = [0x60, 0x90, 60, 100];
        let track = TrackSequencer::new(&data, 0..4);
        assert_eq!(track.next_tick(), Some(0x60));
        assert!(!track.is_end());
    }

    #[test]
    fn empty_track_is_already_ended() {
        let track = TrackSequencer::new(&[], 0..0);
        assert_eq!(track.next_tick(), None);
        assert!(track.is_end());
    }

    #[test]
    fn accumulates_absolute_ticks() {
        let data = [0x10, 0xFF, 0x01, 0x00, 0x20, 0xFF, 0x01, 0x00, 0x05];
        let mut track = TrackSequencer::new(&data, 0..data.len());
        let params = Arc::new(FmParams::new(
            vec![1.0],
            vec![opfm_ir::EnvelopeTable::default()],
            vec![0.0, 1.0],
        ));
        let mut player = MidiPlayer::new(params);
        let mut tempo = TempoState::default();

        track.process(0x10 as f64, &data, &mut player, &mut tempo);
        assert_eq!(track.next_tick(), Some(0x30));
        track.process(0x30 as f64, &data, &mut player, &mut tempo);
        assert_eq!(track.next_tick(), Some(0x35));
    }
}
