//! Packed move value and the fixed-capacity move list.
//!
//! A move packs into one `u32`:
//!
//! | bits  | field                                  |
//! |-------|----------------------------------------|
//! | 0-6   | from square (mailbox index)            |
//! | 7-13  | to square (mailbox index)              |
//! | 14-16 | moved piece code                       |
//! | 17-19 | captured piece code (0 = none)         |
//! | 20-22 | promotion piece code (0 = none)        |
//! | 23    | en-passant capture                     |
//! | 24    | double pawn push                       |
//! | 25    | castle                                 |
//!
//! Piece codes are `PieceKind::index() + 1` so that zero means "no piece".
//! The packed word never leaves this module; callers use the accessors.

use std::fmt;
use std::hash::{Hash, Hasher};

use arrayvec::ArrayVec;

use crate::game_state::chess_types::{PieceKind, Square};

const FROM_SHIFT: u32 = 0;
const TO_SHIFT: u32 = 7;
const MOVED_SHIFT: u32 = 14;
const CAPTURED_SHIFT: u32 = 17;
const PROMOTION_SHIFT: u32 = 20;

const SQUARE_MASK: u32 = 0x7F;
const PIECE_MASK: u32 = 0x7;

const FLAG_EN_PASSANT: u32 = 1 << 23;
const FLAG_DOUBLE_PAWN_PUSH: u32 = 1 << 24;
const FLAG_CASTLE: u32 = 1 << 25;

/// Upper bound on legal moves in any reachable chess position is 218.
pub const MAX_MOVES: usize = 256;

/// Stack-allocated move buffer used by generation and search.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// Special-move marker used when constructing a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFlag {
    Quiet,
    EnPassant,
    DoublePawnPush,
    Castle,
}

/// A single chess move plus a mutable ordering score.
///
/// Equality and hashing look only at the packed move, never at `score`.
#[derive(Clone, Copy, Default)]
pub struct Move {
    bits: u32,
    pub score: i32,
}

impl Move {
    /// Placeholder for "no move".
    pub const NULL: Move = Move { bits: 0, score: 0 };

    pub fn new(
        from: Square,
        to: Square,
        moved: PieceKind,
        captured: Option<PieceKind>,
        promotion: Option<PieceKind>,
        flag: MoveFlag,
    ) -> Self {
        let mut bits = (u32::from(from) & SQUARE_MASK) << FROM_SHIFT;
        bits |= (u32::from(to) & SQUARE_MASK) << TO_SHIFT;
        bits |= piece_code(Some(moved)) << MOVED_SHIFT;
        bits |= piece_code(captured) << CAPTURED_SHIFT;
        bits |= piece_code(promotion) << PROMOTION_SHIFT;
        bits |= match flag {
            MoveFlag::Quiet => 0,
            MoveFlag::EnPassant => FLAG_EN_PASSANT,
            MoveFlag::DoublePawnPush => FLAG_DOUBLE_PAWN_PUSH,
            MoveFlag::Castle => FLAG_CASTLE,
        };
        Self { bits, score: 0 }
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub const fn from(self) -> Square {
        ((self.bits >> FROM_SHIFT) & SQUARE_MASK) as Square
    }

    #[inline]
    pub const fn to(self) -> Square {
        ((self.bits >> TO_SHIFT) & SQUARE_MASK) as Square
    }

    /// Piece that moves. Defaults to `Pawn` only for the null move.
    #[inline]
    pub fn moved_piece(self) -> PieceKind {
        piece_from_code((self.bits >> MOVED_SHIFT) & PIECE_MASK).unwrap_or(PieceKind::Pawn)
    }

    #[inline]
    pub fn captured(self) -> Option<PieceKind> {
        piece_from_code((self.bits >> CAPTURED_SHIFT) & PIECE_MASK)
    }

    #[inline]
    pub fn promotion(self) -> Option<PieceKind> {
        piece_from_code((self.bits >> PROMOTION_SHIFT) & PIECE_MASK)
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        (self.bits >> CAPTURED_SHIFT) & PIECE_MASK != 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        (self.bits >> PROMOTION_SHIFT) & PIECE_MASK != 0
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.bits & FLAG_EN_PASSANT != 0
    }

    #[inline]
    pub const fn is_double_pawn_push(self) -> bool {
        self.bits & FLAG_DOUBLE_PAWN_PUSH != 0
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        self.bits & FLAG_CASTLE != 0
    }

    /// Captures and promotions.
    #[inline]
    pub const fn is_tactical(self) -> bool {
        self.is_capture() || self.is_promotion()
    }

    #[inline]
    pub const fn is_quiet(self) -> bool {
        !self.is_tactical()
    }

    /// Raw storage word for the transposition table.
    #[inline]
    pub(crate) const fn to_packed(self) -> u32 {
        self.bits
    }

    /// Inverse of [`Move::to_packed`]. Returns `None` for words whose fields
    /// cannot belong to a generated move.
    pub(crate) fn from_packed(bits: u32) -> Option<Move> {
        if bits == 0 {
            return Some(Move::NULL);
        }
        let mv = Move { bits, score: 0 };
        let valid = bits >> 26 == 0
            && crate::game_state::chess_types::is_playable(mv.from())
            && crate::game_state::chess_types::is_playable(mv.to())
            && mv.from() != mv.to()
            && (bits >> MOVED_SHIFT) & PIECE_MASK != 0
            && (bits >> MOVED_SHIFT) & PIECE_MASK <= 6
            && (bits >> CAPTURED_SHIFT) & PIECE_MASK <= 5
            && (bits >> PROMOTION_SHIFT) & PIECE_MASK <= 5;
        valid.then_some(mv)
    }
}

#[inline]
fn piece_code(kind: Option<PieceKind>) -> u32 {
    kind.map(|k| k.index() as u32 + 1).unwrap_or(0)
}

#[inline]
fn piece_from_code(code: u32) -> Option<PieceKind> {
    code.checked_sub(1)
        .and_then(|idx| PieceKind::from_index(idx as usize))
}

impl PartialEq for Move {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Move(null)");
        }
        write!(f, "Move({})", crate::utils::long_algebraic::move_to_long_algebraic(*self))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        f.write_str(&crate::utils::long_algebraic::move_to_long_algebraic(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_types::{square_from_coords, E1, G1};

    #[test]
    fn accessors_recover_fields() {
        let from = square_from_coords(1, 6);
        let to = square_from_coords(0, 7);
        let mv = Move::new(
            from,
            to,
            PieceKind::Pawn,
            Some(PieceKind::Rook),
            Some(PieceKind::Queen),
            MoveFlag::Quiet,
        );
        assert_eq!(mv.from(), from);
        assert_eq!(mv.to(), to);
        assert_eq!(mv.moved_piece(), PieceKind::Pawn);
        assert_eq!(mv.captured(), Some(PieceKind::Rook));
        assert_eq!(mv.promotion(), Some(PieceKind::Queen));
        assert!(mv.is_capture() && mv.is_promotion() && mv.is_tactical());
        assert!(!mv.is_en_passant() && !mv.is_castle() && !mv.is_double_pawn_push());
    }

    #[test]
    fn score_is_ignored_by_equality() {
        let mut a = Move::new(E1, G1, PieceKind::King, None, None, MoveFlag::Castle);
        let b = a;
        a.score = 12_345;
        assert_eq!(a, b);
        assert!(a.is_castle());
        assert!(a.is_quiet());
    }

    #[test]
    fn packed_words_validate() {
        let mv = Move::new(E1, G1, PieceKind::King, None, None, MoveFlag::Castle);
        assert_eq!(Move::from_packed(mv.to_packed()), Some(mv));
        assert_eq!(Move::from_packed(0), Some(Move::NULL));
        // from square 0 is off the board
        assert_eq!(Move::from_packed(1 << TO_SHIFT), None);
    }

    #[test]
    fn move_list_is_fixed_capacity() {
        let list = MoveList::new();
        assert_eq!(list.capacity(), MAX_MOVES);
    }
}
