//! Per-channel controller state for MIDI playback.

use opfm_ir::ChannelIndex;

/// Controller state for a single MIDI channel.
///
/// Lives independently of the channel's voices and survives note changes.
/// `final_volume` and `final_pitch` are derived values; nothing in the
/// synthesis path reads them yet.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelState {
    /// Channel index (0-15)
    pub index: ChannelIndex,
    /// Modulation wheel (0.0-1.0)
    pub modulation: f32,
    /// Channel volume (0.0-1.0)
    pub volume: f32,
    /// Expression (0.0-1.0)
    pub expression: f32,
    /// volume × expression
    pub final_volume: f32,
    /// Pitch bend (-1.0-1.0)
    pub pitch_bend: f32,
    /// Pitch bend range multiplier
    pub pitch_sensitivity: f32,
    /// pitch_bend × pitch_sensitivity
    pub final_pitch: f32,
    /// Pan (-1.0 left to 1.0 right)
    pub pan: f32,
    /// Sustain pedal held
    pub sustain: bool,
}

impl ChannelState {
    pub fn new(index: ChannelIndex) -> Self {
        Self {
            index,
            modulation: 0.0,
            volume: 1.0,
            expression: 1.0,
            final_volume: 1.0,
            pitch_bend: 0.0,
            pitch_sensitivity: 1.0,
            final_pitch: 0.0,
            pan: 0.0,
            sustain: false,
        }
    }

    /// Restore controller defaults, keeping the index.
    pub fn reset(&mut self) {
        *self = Self::new(self.index);
    }

    /// CC1.
    pub fn set_modulation(&mut self, value: u8) {
        self.modulation = value as f32 / 127.0;
    }

    /// CC7.
    pub fn set_volume(&mut self, value: u8) {
        self.volume = value as f32 / 127.0;
        self.final_volume = self.volume * self.expression;
    }

    /// CC10.
    pub fn set_pan(&mut self, value: u8) {
        self.pan = (value as f32 - 64.0) / 63.0;
    }

    /// CC11.
    pub fn set_expression(&mut self, value: u8) {
        self.expression = value as f32 / 127.0;
        self.final_volume = self.volume * self.expression;
    }

    /// CC64.
    pub fn set_sustain(&mut self, value: u8) {
        self.sustain = value >= 64;
    }

    /// Pitch bend from its two 7-bit data bytes.
    pub fn set_pitch_bend(&mut self, lsb: u8, msb: u8) {
        let raw = ((msb as i32 & 0x7F) << 7) | (lsb as i32 & 0x7F);
        self.pitch_bend = (raw - 8192) as f32 / 8191.0;
        self.final_pitch = self.pitch_bend * self.pitch_sensitivity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ch = ChannelState::new(3);
        assert_eq!(ch.index, 3);
        assert_eq!(ch.volume, 1.0);
        assert_eq!(ch.expression, 1.0);
        assert_eq!(ch.final_volume, 1.0);
        assert_eq!(ch.pitch_sensitivity, 1.0);
        assert_eq!(ch.pitch_bend, 0.0);
        assert!(!ch.sustain);
    }

    #[test]
    fn final_volume_tracks_volume_and_expression() {
        let mut ch = ChannelState::new(0);
        ch.set_volume(127);
        ch.set_expression(0);
        assert_eq!(ch.final_volume, 0.0);
        ch.set_expression(127);
        assert_eq!(ch.final_volume, 1.0);
        ch.set_volume(0);
        assert_eq!(ch.final_volume, 0.0);
    }

    #[test]
    fn pan_range() {
        let mut ch = ChannelState::new(0);
        ch.set_pan(64);
        assert_eq!(ch.pan, 0.0);
        ch.set_pan(127);
        assert_eq!(ch.pan, 1.0);
        ch.set_pan(1);
        assert_eq!(ch.pan, -1.0);
    }

    #[test]
    fn sustain_threshold() {
        let mut ch = ChannelState::new(0);
        ch.set_sustain(63);
        assert!(!ch.sustain);
        ch.set_sustain(64);
        assert!(ch.sustain);
    }

    #[test]
    fn pitch_bend_center_and_extremes() {
        let mut ch = ChannelState::new(0);
        ch.set_pitch_bend(0x00, 0x40);
        assert_eq!(ch.pitch_bend, 0.0);
        ch.set_pitch_bend(0x7F, 0x7F);
        assert_eq!(ch.pitch_bend, 1.0);
        assert_eq!(ch.final_pitch, 1.0);
        ch.set_pitch_bend(0x00, 0x00);
        assert!((ch.pitch_bend + 8192.0 / 8191.0).abs() < 1e-6);
    }

    #[test]
    fn reset_keeps_index() {
        let mut ch = ChannelState::new(9);
        ch.set_volume(10);
        ch.set_sustain(127);
        ch.set_pitch_bend(0, 0);
        ch.reset();
        assert_eq!(ch, ChannelState::new(9));
    }
}
