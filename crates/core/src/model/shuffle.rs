use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::question::OPTION_COUNT;

/// Display letters, indexed by display position.
pub const LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShuffleError {
    #[error("not a permutation of the option indices: {0:?}")]
    NotAPermutation([usize; OPTION_COUNT]),
}

/// Per-question permutation mapping display position → canonical option index.
///
/// Drawn fresh for every question and never persisted across questions.
/// Invariant: each canonical index appears exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayShuffle([usize; OPTION_COUNT]);

impl DisplayShuffle {
    /// Draws a uniform random permutation (Fisher–Yates).
    #[must_use]
    pub fn draw() -> Self {
        Self::draw_with(&mut rand::rng())
    }

    /// Draws a permutation from the given source of randomness.
    #[must_use]
    pub fn draw_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut order = [0, 1, 2, 3];
        order.shuffle(rng);
        Self(order)
    }

    /// The identity mapping: display order equals canonical order.
    #[must_use]
    pub fn identity() -> Self {
        Self([0, 1, 2, 3])
    }

    /// Builds a shuffle from an explicit order.
    ///
    /// # Errors
    ///
    /// Returns `ShuffleError::NotAPermutation` unless every canonical index
    /// appears exactly once.
    pub fn from_order(order: [usize; OPTION_COUNT]) -> Result<Self, ShuffleError> {
        let mut seen = [false; OPTION_COUNT];
        for &canonical in &order {
            if canonical >= OPTION_COUNT || seen[canonical] {
                return Err(ShuffleError::NotAPermutation(order));
            }
            seen[canonical] = true;
        }
        Ok(Self(order))
    }

    /// Canonical option index shown at a display position.
    #[must_use]
    pub fn canonical_at(&self, display: usize) -> Option<usize> {
        self.0.get(display).copied()
    }

    /// Display position where a canonical option index is shown.
    #[must_use]
    pub fn display_of(&self, canonical: usize) -> Option<usize> {
        self.0.iter().position(|&c| c == canonical)
    }

    /// Display letter at a display position.
    #[must_use]
    pub fn letter_at(display: usize) -> Option<char> {
        LETTERS.get(display).copied()
    }

    #[must_use]
    pub fn as_order(&self) -> [usize; OPTION_COUNT] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawn_shuffles_are_permutations() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let shuffle = DisplayShuffle::draw_with(&mut rng);
            let mut counts = [0usize; OPTION_COUNT];
            for display in 0..OPTION_COUNT {
                counts[shuffle.canonical_at(display).unwrap()] += 1;
            }
            assert_eq!(counts, [1, 1, 1, 1]);
        }
    }

    #[test]
    fn display_and_canonical_are_inverse() {
        let shuffle = DisplayShuffle::from_order([2, 0, 3, 1]).unwrap();
        for canonical in 0..OPTION_COUNT {
            let display = shuffle.display_of(canonical).unwrap();
            assert_eq!(shuffle.canonical_at(display), Some(canonical));
        }
    }

    #[test]
    fn rejects_non_permutations() {
        assert!(DisplayShuffle::from_order([0, 0, 1, 2]).is_err());
        assert!(DisplayShuffle::from_order([0, 1, 2, 4]).is_err());
    }

    #[test]
    fn letters_follow_display_positions() {
        assert_eq!(DisplayShuffle::letter_at(0), Some('A'));
        assert_eq!(DisplayShuffle::letter_at(3), Some('D'));
        assert_eq!(DisplayShuffle::letter_at(4), None);
    }
}
