//! MidiPlayer: byte-at-a-time MIDI message decoder driving the mixer.

use alloc::sync::Arc;
use alloc::vec::Vec;
use opfm_ir::{AudioBlock, ChannelIndex, FmParams, NoteNumber, CHANNEL_COUNT};

use crate::channel::ChannelState;
use crate::mixer::ChannelMixer;

/// Note-ons on this channel are ignored.
pub const MUTED_CHANNEL: ChannelIndex = 10;

/// Semitones subtracted from every incoming note-on key.
pub const NOTE_OFFSET: u8 = 12;

/// How a MIDI note-off reaches the voice pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoteOffMode {
    /// Remove the voice at the received key immediately.
    #[default]
    Remove,
    /// Gate off the voice started by the matching note-on and let its
    /// envelopes release.
    Release,
}

/// Control change numbers with an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controller {
    Modulation,
    Volume,
    Pan,
    Expression,
    Sustain,
    ResetAllControllers,
    AllNotesOff,
    Unknown,
}

impl Controller {
    pub fn from_number(number: u8) -> Self {
        match number {
            1 => Controller::Modulation,
            7 => Controller::Volume,
            10 => Controller::Pan,
            11 => Controller::Expression,
            64 => Controller::Sustain,
            121 => Controller::ResetAllControllers,
            123 => Controller::AllNotesOff,
            _ => Controller::Unknown,
        }
    }
}

/// What the next data byte means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageState {
    /// System message or nothing received yet; data bytes are discarded.
    Waiting,
    NoteOffKey,
    NoteOffVelocity { key: u8 },
    NoteOnKey,
    NoteOnVelocity { key: u8 },
    PolyPressureKey,
    PolyPressureValue,
    ControlNumber,
    ControlValue(Controller),
    ProgramChange,
    ChannelPressure,
    PitchBendLsb,
    PitchBendMsb { lsb: u8 },
}

impl MessageState {
    /// Initial state for a status byte's message type.
    fn for_status(status: u8) -> Self {
        match (status >> 4) & 0x7 {
            0 => MessageState::NoteOffKey,
            1 => MessageState::NoteOnKey,
            2 => MessageState::PolyPressureKey,
            3 => MessageState::ControlNumber,
            4 => MessageState::ProgramChange,
            5 => MessageState::ChannelPressure,
            6 => MessageState::PitchBendLsb,
            _ => MessageState::Waiting,
        }
    }
}

/// A 16-channel MIDI synthesizer fed one byte at a time.
pub struct MidiPlayer {
    state: MessageState,
    channel: ChannelIndex,
    channels: Vec<ChannelState>,
    mixer: ChannelMixer,
    note_off_mode: NoteOffMode,
}

impl MidiPlayer {
    pub fn new(params: Arc<FmParams>) -> Self {
        Self {
            state: MessageState::Waiting,
            channel: 0,
            channels: (0..CHANNEL_COUNT as ChannelIndex).map(ChannelState::new).collect(),
            mixer: ChannelMixer::new(params),
            note_off_mode: NoteOffMode::default(),
        }
    }

    pub fn with_note_off_mode(mut self, mode: NoteOffMode) -> Self {
        self.note_off_mode = mode;
        self
    }

    pub fn note_off_mode(&self) -> NoteOffMode {
        self.note_off_mode
    }

    /// Feed one byte.
    ///
    /// Returns `true` when the byte completed a message, after which either a
    /// new status byte or more data bytes (running status) may follow.
    pub fn event(&mut self, byte: u8) -> bool {
        if byte >= 0x80 {
            self.channel = byte & 0x0F;
            self.state = MessageState::for_status(byte);
            return self.state == MessageState::Waiting;
        }
        self.data(byte)
    }

    /// Feed a run of bytes. Returns the number of completed messages.
    pub fn events(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.event(b)).count()
    }

    /// Render one block from every channel.
    pub fn render(&mut self, out: &mut AudioBlock) {
        self.mixer.render(out);
    }

    /// Controller state of `channel`.
    pub fn channel(&self, channel: ChannelIndex) -> Option<&ChannelState> {
        self.channels.get(channel as usize)
    }

    pub fn mixer(&self) -> &ChannelMixer {
        &self.mixer
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    /// Drop all voices and restore every channel's controllers.
    pub fn reset(&mut self) {
        self.mixer.reset();
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    fn data(&mut self, byte: u8) -> bool {
        let (next, complete) = match self.state {
            MessageState::Waiting => (MessageState::Waiting, true),
            MessageState::NoteOffKey => (MessageState::NoteOffVelocity { key: byte }, false),
            MessageState::NoteOffVelocity { key } => {
                self.note_off(key);
                (MessageState::NoteOffKey, true)
            }
            MessageState::NoteOnKey => (MessageState::NoteOnVelocity { key: byte }, false),
            MessageState::NoteOnVelocity { key } => {
                self.note_on(key, byte);
                (MessageState::NoteOnKey, true)
            }
            MessageState::PolyPressureKey => (MessageState::PolyPressureValue, false),
            MessageState::PolyPressureValue => (MessageState::PolyPressureKey, true),
            MessageState::ControlNumber => {
                (MessageState::ControlValue(Controller::from_number(byte)), false)
            }
            MessageState::ControlValue(controller) => {
                self.control_change(controller, byte);
                (MessageState::ControlNumber, true)
            }
            MessageState::ProgramChange => (MessageState::ProgramChange, true),
            MessageState::ChannelPressure => (MessageState::ChannelPressure, true),
            MessageState::PitchBendLsb => (MessageState::PitchBendMsb { lsb: byte }, false),
            MessageState::PitchBendMsb { lsb } => {
                if let Some(ch) = self.channels.get_mut(self.channel as usize) {
                    ch.set_pitch_bend(lsb, byte);
                }
                (MessageState::PitchBendLsb, true)
            }
        };
        self.state = next;
        complete
    }

    fn note_on(&mut self, key: u8, velocity: u8) {
        if self.channel == MUTED_CHANNEL {
            return;
        }
        if let Some(note) = key.checked_sub(NOTE_OFFSET) {
            self.mixer.note_on(self.channel, note, velocity);
        }
    }

    fn note_off(&mut self, key: NoteNumber) {
        match self.note_off_mode {
            NoteOffMode::Remove => self.mixer.note_off(self.channel, key),
            NoteOffMode::Release => {
                if let Some(note) = key.checked_sub(NOTE_OFFSET) {
                    self.mixer.release(self.channel, note);
                }
            }
        }
    }

    fn control_change(&mut self, controller: Controller, value: u8) {
        if controller == Controller::ResetAllControllers {
            log::debug!("reset all controllers (channel {})", self.channel);
            self.reset();
            return;
        }
        let Some(ch) = self.channels.get_mut(self.channel as usize) else {
            return;
        };
        match controller {
            Controller::Modulation => ch.set_modulation(value),
            Controller::Volume => ch.set_volume(value),
            Controller::Pan => ch.set_pan(value),
            Controller::Expression => ch.set_expression(value),
            Controller::Sustain => ch.set_sustain(value),
            // No voice silencing on all-notes-off.
            Controller::AllNotesOff | Controller::Unknown | Controller::ResetAllControllers => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::Voice;
    use alloc::vec;
    use opfm_ir::{EnvelopeKeyframe, EnvelopeTable};

    fn params(keyframe: EnvelopeKeyframe) -> Arc<FmParams> {
        Arc::new(FmParams::new(
            vec![1.0],
            vec![EnvelopeTable::single(keyframe)],
            vec![0.0, 1.0],
        ))
    }

    fn player() -> MidiPlayer {
        MidiPlayer::new(params(EnvelopeKeyframe::default()))
    }

    fn voice_count(player: &MidiPlayer, channel: ChannelIndex) -> usize {
        player.mixer().pool(channel).map_or(0, |p| p.active_count())
    }

    #[test]
    fn status_byte_alone_is_incomplete() {
        let mut p = player();
        assert!(!p.event(0x90));
        assert!(!p.event(0x80));
        assert!(!p.event(0xB3));
        assert_eq!(p.state(), MessageState::ControlNumber);
    }

    #[test]
    fn note_on_shifts_down_an_octave() {
        let mut p = player();
        assert!(!p.event(0x90));
        assert!(!p.event(60));
        assert!(p.event(100));
        let voice = p.mixer().pool(0).and_then(|pool| pool.get(48));
        assert_eq!(voice.map(Voice::note), Some(48));
        assert_eq!(voice.map(Voice::velocity), Some(100.0 / 128.0));
    }

    #[test]
    fn running_status_note_ons() {
        let mut p = player();
        assert_eq!(p.events(&[0x90, 60, 100, 62, 100]), 2);
        let pool = p.mixer().pool(0).unwrap();
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.get(48).map(Voice::velocity), Some(100.0 / 128.0));
        assert_eq!(pool.get(50).map(Voice::velocity), Some(100.0 / 128.0));
    }

    #[test]
    fn channel_ten_is_muted() {
        let mut p = player();
        p.events(&[0x9A, 60, 100]);
        assert_eq!(voice_count(&p, 10), 0);
        p.events(&[0x99, 60, 100]);
        assert_eq!(voice_count(&p, 9), 1);
    }

    #[test]
    fn low_keys_are_dropped() {
        let mut p = player();
        p.events(&[0x90, 11, 100, 12, 100]);
        let pool = p.mixer().pool(0).unwrap();
        assert_eq!(pool.active_count(), 1);
        assert!(pool.get(0).is_some());
    }

    #[test]
    fn note_off_removes_received_key() {
        let mut p = player();
        // Note-on 72 sounds at 60; note-off 60 removes it.
        p.events(&[0x91, 72, 100]);
        assert_eq!(voice_count(&p, 1), 1);
        p.events(&[0x81, 72, 0]);
        assert_eq!(voice_count(&p, 1), 1);
        assert_eq!(p.events(&[0x81, 60, 0]), 1);
        assert_eq!(voice_count(&p, 1), 0);
    }

    #[test]
    fn release_mode_plays_release_phase() {
        let keyframe = EnvelopeKeyframe {
            release_length: 0.01,
            ..EnvelopeKeyframe::default()
        };
        let mut p = MidiPlayer::new(params(keyframe)).with_note_off_mode(NoteOffMode::Release);
        p.events(&[0x90, 72, 100, 0x80, 72, 0]);
        // Still sounding in its release.
        assert_eq!(voice_count(&p, 0), 1);

        let mut out = AudioBlock::new();
        p.render(&mut out);
        assert!(out.peak() > 0.0);
        for _ in 0..20 {
            p.render(&mut out);
        }
        assert_eq!(voice_count(&p, 0), 0);
    }

    #[test]
    fn velocity_zero_note_on_is_literal() {
        let mut p = player();
        p.events(&[0x90, 60, 0]);
        let voice = p.mixer().pool(0).and_then(|pool| pool.get(48));
        assert_eq!(voice.map(Voice::velocity), Some(0.0));
    }

    #[test]
    fn control_changes_update_channel_state() {
        let mut p = player();
        assert_eq!(p.events(&[0xB2, 7, 0, 11, 127, 10, 127, 1, 127, 64, 100]), 5);
        let ch = p.channel(2).unwrap();
        assert_eq!(ch.volume, 0.0);
        assert_eq!(ch.expression, 1.0);
        assert_eq!(ch.final_volume, 0.0);
        assert_eq!(ch.pan, 1.0);
        assert_eq!(ch.modulation, 1.0);
        assert!(ch.sustain);
        assert_eq!(p.channel(0), Some(&ChannelState::new(0)));
    }

    #[test]
    fn unknown_controller_is_consumed() {
        let mut p = player();
        assert_eq!(p.events(&[0xB0, 74, 12, 7, 0]), 2);
        assert_eq!(p.channel(0).map(|c| c.volume), Some(0.0));
    }

    #[test]
    fn reset_all_controllers_clears_everything() {
        let mut p = player();
        p.events(&[0x90, 60, 100, 0x93, 64, 90, 0xB3, 7, 20]);
        assert_eq!(p.mixer().active_count(), 2);
        assert_eq!(p.events(&[0xB5, 121, 0]), 1);
        assert_eq!(p.mixer().active_count(), 0);
        assert_eq!(p.channel(3), Some(&ChannelState::new(3)));
    }

    #[test]
    fn all_notes_off_leaves_voices() {
        let mut p = player();
        p.events(&[0x90, 60, 100]);
        assert_eq!(p.events(&[0xB0, 123, 0]), 1);
        assert_eq!(voice_count(&p, 0), 1);
    }

    #[test]
    fn pitch_bend_running_status() {
        let mut p = player();
        assert_eq!(p.events(&[0xE4, 0x00, 0x40, 0x7F, 0x7F]), 2);
        let ch = p.channel(4).unwrap();
        assert_eq!(ch.pitch_bend, 1.0);
        assert_eq!(ch.final_pitch, 1.0);
    }

    #[test]
    fn single_byte_messages_complete_per_data_byte() {
        let mut p = player();
        assert!(!p.event(0xC0));
        assert!(p.event(5));
        assert!(p.event(6));
        assert!(!p.event(0xD0));
        assert!(p.event(100));
        assert!(!p.event(0xA0));
        assert!(!p.event(60));
        assert!(p.event(10));
    }

    #[test]
    fn system_status_waits() {
        let mut p = player();
        assert!(p.event(0xF0));
        assert_eq!(p.state(), MessageState::Waiting);
        assert!(p.event(0x12));
        assert_eq!(p.mixer().active_count(), 0);
    }

    #[test]
    fn data_before_any_status_is_ignored() {
        let mut p = player();
        assert!(p.event(60));
        assert!(p.event(100));
        assert_eq!(p.mixer().active_count(), 0);
    }
}
