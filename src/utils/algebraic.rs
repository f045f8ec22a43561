//! Square conversions for long algebraic coordinates.
//!
//! Converts between human-readable coordinates (e.g., `e4`) and mailbox
//! square indices reused by FEN and UCI components.

use crate::errors::MoveParseError;
use crate::game_state::chess_types::{file_of, is_playable, rank_of, square_from_coords, Square};

/// Convert long algebraic notation (for example: "e4") to a mailbox square.
#[inline]
pub fn algebraic_to_square(square: &str) -> Result<Square, MoveParseError> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(MoveParseError::BadSquare(square.to_owned()));
    }

    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(MoveParseError::BadSquare(square.to_owned()));
    }

    Ok(square_from_coords(file - b'a', rank - b'1'))
}

/// Convert a playable mailbox square to long algebraic notation.
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    if !is_playable(square) {
        return "-".to_owned();
    }
    let file_char = char::from(b'a' + file_of(square));
    let rank_char = char::from(b'1' + rank_of(square));
    format!("{file_char}{rank_char}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_types::{A1, H8};

    #[test]
    fn corners_round_trip() {
        assert_eq!(algebraic_to_square("a1"), Ok(A1));
        assert_eq!(algebraic_to_square("h8"), Ok(H8));
        assert_eq!(square_to_algebraic(A1), "a1");
        assert_eq!(square_to_algebraic(H8), "h8");
        assert!(algebraic_to_square("i9").is_err());
        assert!(algebraic_to_square("e").is_err());
    }
}
