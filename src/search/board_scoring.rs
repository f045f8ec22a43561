//! Pluggable board evaluation interface and the material baseline.
//!
//! Search stays independent of evaluation by delegating static position
//! scoring to [`Evaluator`], so heuristics can be swapped without touching
//! search code.

use crate::game_state::chess_types::*;

pub trait Evaluator: Send + Sync {
    /// Score in centipawns from the perspective of the side to move.
    ///
    /// Must be deterministic, and a position and its colour-mirror must
    /// receive the same score.
    fn evaluate(&self, position: &Position) -> i32;
}

/// Material balance only (P100 N320 B330 R500 Q900, king excluded), read
/// from the position's incremental totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    #[inline]
    fn evaluate(&self, position: &Position) -> i32 {
        let us = position.side_to_move();
        position.material(us) - position.material(us.opposite())
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    #[inline]
    fn evaluate(&self, position: &Position) -> i32 {
        (**self).evaluate(position)
    }
}
