//! Voice: one sounding note of the operator network.

use arrayvec::ArrayVec;
use core::f32::consts::TAU;

use opfm_ir::{
    AudioBlock, FmParams, NoteNumber, Velocity, WeightKeyframe, BLOCK_SIZE, MAX_OPERATORS,
};

use crate::envelope::Envelope;
use crate::frequency::note_to_increment;

/// Weight vector capacity for the largest supported network.
const MAX_WEIGHTS: usize = WeightKeyframe::len_for(MAX_OPERATORS);

/// One sinusoidal operator inside a voice.
#[derive(Clone, Debug)]
struct Operator {
    envelope: Envelope,
    /// Phase accumulator in radians, kept in [0, 2π).
    phase: f32,
    /// Phase increment per sample.
    increment: f32,
    /// Last output sample, fed back through the modulation matrix.
    prev: f32,
}

/// A single note rendered by an N-operator phase-modulation network.
///
/// Storage is inline so starting and dropping voices never touches the heap.
#[derive(Clone, Debug)]
pub struct Voice {
    note: NoteNumber,
    /// Velocity scale, `velocity / 128`.
    velocity: f32,
    /// Modulation matrix (`to * n + from`) followed by the output mix.
    weights: ArrayVec<f32, MAX_WEIGHTS>,
    operators: ArrayVec<Operator, MAX_OPERATORS>,
}

impl Voice {
    /// Create a voice for `note` at `velocity`, resolving every note-keyed
    /// parameter once.
    ///
    /// A network larger than [`MAX_OPERATORS`] yields a voice with no
    /// operators, which renders silence and has already ended.
    pub fn new(params: &FmParams, note: NoteNumber, velocity: Velocity) -> Self {
        let count = params.operator_count();
        let mut weights = ArrayVec::new();
        let mut operators = ArrayVec::new();
        if count <= MAX_OPERATORS {
            weights.extend(core::iter::repeat(0.0).take(WeightKeyframe::len_for(count)));
            // Malformed weights stay zeroed and the voice renders silence.
            params.weights_into(note, &mut weights);
            for (i, &ratio) in params.ratios().iter().enumerate() {
                operators.push(Operator {
                    envelope: Envelope::from_keyframe(params.envelope_at(i, note)),
                    phase: 0.0,
                    increment: note_to_increment(note, ratio),
                    prev: 0.0,
                });
            }
        } else {
            log::warn!("{} operators exceed the {} a voice can render", count, MAX_OPERATORS);
        }
        Self {
            note,
            velocity: velocity as f32 / 128.0,
            weights,
            operators,
        }
    }

    pub fn note(&self) -> NoteNumber {
        self.note
    }

    /// Velocity scale applied to the output (`velocity / 128`).
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Gate off every operator envelope.
    pub fn note_off(&mut self) {
        for op in &mut self.operators {
            op.envelope.note_off();
        }
    }

    /// True once every operator envelope has ended.
    pub fn is_end(&self) -> bool {
        self.operators.iter().all(|op| op.envelope.is_end())
    }

    /// Render one block, overwriting `out`.
    pub fn render(&mut self, out: &mut AudioBlock) {
        let mut levels = [[0.0f32; BLOCK_SIZE]; MAX_OPERATORS];
        for (op, block) in self.operators.iter_mut().zip(levels.iter_mut()) {
            op.envelope.advance(block);
        }

        let n = self.operators.len();
        let (matrix, mix) = self.weights.split_at(n * n);
        for (i, sample) in out.samples_mut().iter_mut().enumerate() {
            let mut sum = 0.0;
            for to in 0..n {
                let mut offset = 0.0;
                for from in 0..n {
                    offset += matrix[to * n + from] * self.operators[from].prev;
                }
                let op = &mut self.operators[to];
                let value = levels[to][i] * libm::sinf(op.phase + offset);
                op.prev = if value.is_finite() { value } else { 0.0 };
                sum += mix[to] * op.prev;
                op.phase += op.increment;
                if op.phase >= TAU {
                    op.phase = libm::fmodf(op.phase, TAU);
                }
            }
            *sample = sum * self.velocity;
        }
    }
}
