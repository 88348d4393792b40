//! VoicePool: the sounding notes of one MIDI channel.

use alloc::sync::Arc;
use alloc::vec::Vec;
use opfm_ir::{AudioBlock, FmParams, NoteNumber, Velocity, MAX_NOTE_NUMBER};

use crate::voice::Voice;

/// Note-indexed pool of voices. At most one voice sounds per note.
pub struct VoicePool {
    params: Arc<FmParams>,
    /// One slot per note number (None = silent).
    slots: Vec<Option<Voice>>,
    /// Per-voice render target.
    scratch: AudioBlock,
}

impl VoicePool {
    /// Create an empty pool sharing `params`.
    pub fn new(params: Arc<FmParams>) -> Self {
        Self {
            params,
            slots: (0..MAX_NOTE_NUMBER).map(|_| None).collect(),
            scratch: AudioBlock::new(),
        }
    }

    /// Start `note`, replacing any voice already on it without a crossfade.
    pub fn note_on(&mut self, note: NoteNumber, velocity: Velocity) {
        if let Some(slot) = self.slots.get_mut(note as usize) {
            *slot = Some(Voice::new(&self.params, note, velocity));
        }
    }

    /// Remove the voice on `note` immediately. Its release phase never plays.
    pub fn note_off(&mut self, note: NoteNumber) {
        if let Some(slot) = self.slots.get_mut(note as usize) {
            *slot = None;
        }
    }

    /// Gate off the voice on `note`, letting its envelopes release. The voice
    /// is pruned by `render` once it has ended.
    pub fn release(&mut self, note: NoteNumber) {
        if let Some(Some(voice)) = self.slots.get_mut(note as usize) {
            voice.note_off();
        }
    }

    /// Drop every voice.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Get the voice sounding on `note`.
    pub fn get(&self, note: NoteNumber) -> Option<&Voice> {
        self.slots.get(note as usize).and_then(|s| s.as_ref())
    }

    /// Count of occupied note slots.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Render the sum of all voices into `out`, then prune voices that ended.
    pub fn render(&mut self, out: &mut AudioBlock) {
        out.silence();
        let scratch = &mut self.scratch;
        for voice in self.slots.iter_mut().flatten() {
            voice.render(scratch);
            out.mix_from(scratch);
        }
        self.reap_finished();
    }

    /// Remove voices whose envelopes have all ended.
    fn reap_finished(&mut self) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(Voice::is_end) {
                *slot = None;
            }
        }
    }
}
