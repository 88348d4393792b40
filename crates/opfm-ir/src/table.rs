//! Note-keyed keyframe tables.

use alloc::collections::BTreeMap;
use core::ops::Bound::{Excluded, Unbounded};

use crate::NoteNumber;

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// A keyframe that can be blended with another keyframe of the same kind.
pub trait Lerp: Clone {
    /// Blend `self` toward `other` by `t` in [0, 1].
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

/// Keyframes indexed by note number.
///
/// Lookups between two keys interpolate linearly; lookups outside the key
/// range clamp to the nearest key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NoteTable<T> {
    keyframes: BTreeMap<NoteNumber, T>,
}

impl<T> NoteTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self { keyframes: BTreeMap::new() }
    }

    /// Create a table holding one keyframe that applies to every note.
    pub fn single(keyframe: T) -> Self {
        let mut table = Self::new();
        table.insert(0, keyframe);
        table
    }

    /// Insert a keyframe, returning the one it replaced.
    pub fn insert(&mut self, note: NoteNumber, keyframe: T) -> Option<T> {
        self.keyframes.insert(note, keyframe)
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Iterate keyframes in ascending note order.
    pub fn iter(&self) -> impl Iterator<Item = (NoteNumber, &T)> {
        self.keyframes.iter().map(|(k, v)| (*k, v))
    }

    /// The keyframes surrounding `note` and the blend position between them.
    ///
    /// The upper key is the first key strictly above `note`; the lower key is
    /// the one before it. Below the first key or above the last, both
    /// references point at the nearest keyframe with position 0. Returns
    /// `None` for an empty table.
    pub fn bracket(&self, note: NoteNumber) -> Option<(&T, &T, f32)> {
        let lower = self.keyframes.range(..=note).next_back();
        let upper = self.keyframes.range((Excluded(note), Unbounded)).next();
        match (lower, upper) {
            (Some((&lo_key, lo)), Some((&hi_key, hi))) => {
                let pos = (note - lo_key) as f32 / (hi_key - lo_key) as f32;
                Some((lo, hi, pos))
            }
            (Some((_, only)), None) | (None, Some((_, only))) => Some((only, only, 0.0)),
            (None, None) => None,
        }
    }
}

impl<T: Lerp> NoteTable<T> {
    /// Resolve the keyframe for `note`, interpolating between the keys that
    /// [`bracket`](Self::bracket) finds.
    pub fn at(&self, note: NoteNumber) -> Option<T> {
        let (lo, hi, pos) = self.bracket(note)?;
        if pos == 0.0 {
            Some(lo.clone())
        } else {
            Some(lo.lerp(hi, pos))
        }
    }
}

impl<T> Default for NoteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(NoteNumber, T)> for NoteTable<T> {
    fn from_iter<I: IntoIterator<Item = (NoteNumber, T)>>(iter: I) -> Self {
        Self { keyframes: iter.into_iter().collect() }
    }
}
