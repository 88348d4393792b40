//! Modulation matrix and output mix weights.

use alloc::vec::Vec;

use crate::table::{lerp, Lerp};

/// Flat weight vector for an `n`-operator network.
///
/// The first `n * n` entries are the modulation matrix, indexed
/// `to * n + from`. The last `n` entries are the per-operator output mix.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WeightKeyframe {
    values: Vec<f32>,
}

impl WeightKeyframe {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Expected vector length for `operator_count` operators.
    pub const fn len_for(operator_count: usize) -> usize {
        operator_count * (operator_count + 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Lerp for WeightKeyframe {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(&a, &b)| lerp(a, b, t))
            .collect();
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn expected_length_covers_matrix_and_output() {
        // 4 operators: 16 matrix entries plus 4 output weights
        assert_eq!(WeightKeyframe::len_for(4), 20);
        assert_eq!(WeightKeyframe::len_for(1), 2);
    }

    #[test]
    fn lerp_is_elementwise() {
        let a = WeightKeyframe::new(vec![0.0, 2.0]);
        let b = WeightKeyframe::new(vec![1.0, 4.0]);
        assert_eq!(a.lerp(&b, 0.5).as_slice(), &[0.5, 3.0]);
    }
}
