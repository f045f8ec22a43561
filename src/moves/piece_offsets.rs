//! Mailbox step tables for every piece kind.
//!
//! Offsets are in 10x12 mailbox units: +1 is one file east, +10 one rank north.

pub const KNIGHT_OFFSETS: [i8; 8] = [-21, -19, -12, -8, 8, 12, 19, 21];
pub const KING_OFFSETS: [i8; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];
pub const ROOK_DIRECTIONS: [i8; 4] = [-10, -1, 1, 10];
pub const BISHOP_DIRECTIONS: [i8; 4] = [-11, -9, 9, 11];
pub const QUEEN_DIRECTIONS: [i8; 8] = KING_OFFSETS;

/// Diagonal steps a pawn of each color captures along, indexed by `Color::index()`.
pub const PAWN_CAPTURE_OFFSETS: [[i8; 2]; 2] = [[9, 11], [-9, -11]];

/// Ray step from `from` toward `to` when they share a rank or file.
#[inline]
pub fn orthogonal_step(from: u8, to: u8) -> Option<i8> {
    let (ff, fr) = (from % 10, from / 10);
    let (tf, tr) = (to % 10, to / 10);
    if from == to {
        None
    } else if fr == tr {
        Some(if tf > ff { 1 } else { -1 })
    } else if ff == tf {
        Some(if tr > fr { 10 } else { -10 })
    } else {
        None
    }
}

/// Ray step from `from` toward `to` when they share a diagonal.
#[inline]
pub fn diagonal_step(from: u8, to: u8) -> Option<i8> {
    let df = i16::from(to % 10) - i16::from(from % 10);
    let dr = i16::from(to / 10) - i16::from(from / 10);
    if df == 0 || df.abs() != dr.abs() {
        return None;
    }
    Some(match (df > 0, dr > 0) {
        (true, true) => 11,
        (false, true) => 9,
        (true, false) => -9,
        (false, false) => -11,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_types::{A1, A8, H1, H8};

    #[test]
    fn alignment_steps() {
        assert_eq!(orthogonal_step(A1, H1), Some(1));
        assert_eq!(orthogonal_step(A8, A1), Some(-10));
        assert_eq!(orthogonal_step(A1, H8), None);
        assert_eq!(diagonal_step(A1, H8), Some(11));
        assert_eq!(diagonal_step(H8, A1), Some(-11));
        assert_eq!(diagonal_step(H1, A8), Some(9));
        assert_eq!(diagonal_step(A8, H1), Some(-9));
        assert_eq!(diagonal_step(A1, H1), None);
    }
}
