//! FM instrument parameters.

use alloc::vec::Vec;

use crate::envelope::EnvelopeKeyframe;
use crate::table::{lerp, NoteTable};
use crate::weights::WeightKeyframe;
use crate::{NoteNumber, MAX_NOTE_NUMBER, MAX_OPERATORS};

/// Envelope keyframes for one operator, keyed by note.
pub type EnvelopeTable = NoteTable<EnvelopeKeyframe>;

/// Weight keyframes for the whole network, keyed by note.
pub type WeightTable = NoteTable<WeightKeyframe>;

/// Shape or range problem found by [`FmParams::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("no operators configured")]
    NoOperators,
    #[error("{count} operators configured, at most {max} supported")]
    TooManyOperators { count: usize, max: usize },
    #[error("{ratios} frequency ratios but {envelopes} envelope tables")]
    OperatorCountMismatch { ratios: usize, envelopes: usize },
    #[error("operator {operator}: frequency ratio {value} is not a non-negative finite number")]
    InvalidRatio { operator: usize, value: f32 },
    #[error("operator {operator}: envelope table is empty")]
    EmptyEnvelopeTable { operator: usize },
    #[error("weight table is empty")]
    EmptyWeightTable,
    #[error("weights at note {note}: expected {expected} values, found {found}")]
    WeightLength { note: NoteNumber, expected: usize, found: usize },
    #[error("note key {0} is above 128")]
    NoteOutOfRange(NoteNumber),
    #[error("operator {operator}, note {note}: {field} length {value} is negative")]
    NegativeLength { operator: usize, note: NoteNumber, field: &'static str, value: f32 },
    #[error("operator {operator}, note {note}: {field} {value} is outside [0, 1]")]
    LevelOutOfRange { operator: usize, note: NoteNumber, field: &'static str, value: f32 },
}

/// Immutable description of an N-operator FM instrument.
///
/// Built once by a loader, then shared read-only by every voice. The engine
/// trusts its shape; run [`FmParams::validate`] before handing it over.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FmParams {
    /// Frequency ratio of each operator relative to the note frequency.
    ratios: Vec<f32>,
    /// Envelope table of each operator.
    envelopes: Vec<EnvelopeTable>,
    /// Modulation matrix plus output mix, keyed by note.
    weights: WeightTable,
}

impl FmParams {
    /// Build parameters with one flat weight vector used for every note.
    pub fn new(ratios: Vec<f32>, envelopes: Vec<EnvelopeTable>, weights: Vec<f32>) -> Self {
        Self::with_weight_table(ratios, envelopes, NoteTable::single(WeightKeyframe::new(weights)))
    }

    /// Build parameters whose weights are interpolated per note.
    pub fn with_weight_table(
        ratios: Vec<f32>,
        envelopes: Vec<EnvelopeTable>,
        weights: WeightTable,
    ) -> Self {
        Self { ratios, envelopes, weights }
    }

    /// Number of operators in the network.
    pub fn operator_count(&self) -> usize {
        self.ratios.len()
    }

    pub fn ratios(&self) -> &[f32] {
        &self.ratios
    }

    pub fn envelopes(&self) -> &[EnvelopeTable] {
        &self.envelopes
    }

    pub fn weight_table(&self) -> &WeightTable {
        &self.weights
    }

    /// Envelope keyframe for operator `op` at `note`.
    pub fn envelope_at(&self, op: usize, note: NoteNumber) -> EnvelopeKeyframe {
        self.envelopes
            .get(op)
            .and_then(|table| table.at(note))
            .unwrap_or_default()
    }

    /// Write the weights for `note` into `out` without allocating.
    ///
    /// Returns `false` and leaves `out` untouched when the table is empty or
    /// the bracketing keyframes are not `out.len()` long.
    pub fn weights_into(&self, note: NoteNumber, out: &mut [f32]) -> bool {
        let (lo, hi, pos) = match self.weights.bracket(note) {
            Some(found) => found,
            None => return false,
        };
        if lo.len() != out.len() || hi.len() != out.len() {
            return false;
        }
        for ((o, &a), &b) in out.iter_mut().zip(lo.as_slice()).zip(hi.as_slice()) {
            *o = lerp(a, b, pos);
        }
        true
    }

    /// Check the shape and value ranges a loader must guarantee.
    pub fn validate(&self) -> Result<(), ParamError> {
        let n = self.operator_count();
        if n == 0 {
            return Err(ParamError::NoOperators);
        }
        if n > MAX_OPERATORS {
            return Err(ParamError::TooManyOperators { count: n, max: MAX_OPERATORS });
        }
        if self.envelopes.len() != n {
            return Err(ParamError::OperatorCountMismatch {
                ratios: n,
                envelopes: self.envelopes.len(),
            });
        }
        for (operator, &value) in self.ratios.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamError::InvalidRatio { operator, value });
            }
        }
        for (operator, table) in self.envelopes.iter().enumerate() {
            if table.is_empty() {
                return Err(ParamError::EmptyEnvelopeTable { operator });
            }
            for (note, kf) in table.iter() {
                check_note(note)?;
                for (field, value) in kf.lengths() {
                    if !(value >= 0.0) {
                        return Err(ParamError::NegativeLength { operator, note, field, value });
                    }
                }
                if !(kf.release_length >= 0.0) {
                    return Err(ParamError::NegativeLength {
                        operator,
                        note,
                        field: "release",
                        value: kf.release_length,
                    });
                }
                for (field, value) in kf.levels() {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ParamError::LevelOutOfRange { operator, note, field, value });
                    }
                }
            }
        }
        if self.weights.is_empty() {
            return Err(ParamError::EmptyWeightTable);
        }
        let expected = WeightKeyframe::len_for(n);
        for (note, kf) in self.weights.iter() {
            check_note(note)?;
            if kf.len() != expected {
                return Err(ParamError::WeightLength { note, expected, found: kf.len() });
            }
        }
        Ok(())
    }
}

fn check_note(note: NoteNumber) -> Result<(), ParamError> {
    if note as usize > MAX_NOTE_NUMBER {
        return Err(ParamError::NoteOutOfRange(note));
    }
    Ok(())
}
