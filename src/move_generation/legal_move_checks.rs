//! Attack detection: "is square S attacked by color C".
//!
//! [`is_square_attacked`] is the hot path used for legality filtering and
//! check detection. It reads the piece lists and the king cache and never
//! allocates. [`is_square_attacked_by_scan`] answers the same question from
//! the board array alone and is reserved for positions whose lists are stale.

use crate::game_state::chess_types::*;
use crate::moves::piece_offsets::{
    diagonal_step, orthogonal_step, BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS,
    PAWN_CAPTURE_OFFSETS, ROOK_DIRECTIONS,
};

#[inline]
pub fn is_king_in_check(position: &Position, color: Color) -> bool {
    let king_sq = position.king_square(color);
    if king_sq == NO_SQUARE {
        return false;
    }
    is_square_attacked(position, king_sq, color.opposite())
}

pub fn is_square_attacked(position: &Position, square: Square, attacker: Color) -> bool {
    debug_assert!(
        !position.piece_lists_stale(),
        "fast attack path used with stale piece lists"
    );

    // A pawn attacks `square` from one diagonal step behind it.
    for delta in PAWN_CAPTURE_OFFSETS[attacker.index()] {
        if position
            .piece_at(offset_square(square, -delta))
            .is(attacker, PieceKind::Pawn)
        {
            return true;
        }
    }

    for &from in position.pieces(attacker, PieceKind::Knight) {
        let delta = i16::from(square) - i16::from(from);
        if KNIGHT_OFFSETS.iter().any(|&o| i16::from(o) == delta) {
            return true;
        }
    }

    let king = position.king_square(attacker);
    if king != NO_SQUARE {
        let delta = i16::from(square) - i16::from(king);
        if KING_OFFSETS.iter().any(|&o| i16::from(o) == delta) {
            return true;
        }
    }

    for &from in position
        .pieces(attacker, PieceKind::Rook)
        .iter()
        .chain(position.pieces(attacker, PieceKind::Queen))
    {
        if let Some(step) = orthogonal_step(from, square) {
            if ray_is_open(position, from, square, step) {
                return true;
            }
        }
    }

    for &from in position
        .pieces(attacker, PieceKind::Bishop)
        .iter()
        .chain(position.pieces(attacker, PieceKind::Queen))
    {
        if let Some(step) = diagonal_step(from, square) {
            if ray_is_open(position, from, square, step) {
                return true;
            }
        }
    }

    false
}

/// Every square strictly between two aligned squares is empty.
#[inline]
fn ray_is_open(position: &Position, from: Square, to: Square, step: i8) -> bool {
    let mut sq = offset_square(from, step);
    while sq != to {
        if !position.piece_at(sq).is_empty() {
            return false;
        }
        sq = offset_square(sq, step);
    }
    true
}

/// Board-array fallback for positions edited with `set_cell_unchecked`.
///
/// Walks outward from `square` and never touches the piece lists. Not for
/// use inside search.
pub fn is_square_attacked_by_scan(position: &Position, square: Square, attacker: Color) -> bool {
    for delta in PAWN_CAPTURE_OFFSETS[attacker.index()] {
        if position
            .piece_at(offset_square(square, -delta))
            .is(attacker, PieceKind::Pawn)
        {
            return true;
        }
    }

    for delta in KNIGHT_OFFSETS {
        let from = offset_square(square, delta);
        if is_playable(from) && position.piece_at(from).is(attacker, PieceKind::Knight) {
            return true;
        }
    }

    for delta in KING_OFFSETS {
        if position
            .piece_at(offset_square(square, delta))
            .is(attacker, PieceKind::King)
        {
            return true;
        }
    }

    let slider_hit = |directions: &[i8], kind: PieceKind| {
        directions.iter().any(|&step| {
            let mut sq = offset_square(square, step);
            loop {
                match position.piece_at(sq) {
                    Cell::Empty => sq = offset_square(sq, step),
                    Cell::Piece(color, found) => {
                        return color == attacker && (found == kind || found == PieceKind::Queen)
                    }
                    Cell::OffBoard => return false,
                }
            }
        })
    };

    slider_hit(&ROOK_DIRECTIONS, PieceKind::Rook) || slider_hit(&BISHOP_DIRECTIONS, PieceKind::Bishop)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacked_squares(position: &Position, attacker: Color) -> Vec<Square> {
        playable_squares()
            .filter(|&sq| is_square_attacked(position, sq, attacker))
            .collect()
    }

    #[test]
    fn fast_path_agrees_with_board_scan() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let position = Position::from_fen(fen).expect("FEN should parse");
            for attacker in Color::ALL {
                let fast = attacked_squares(&position, attacker);
                let scan: Vec<Square> = playable_squares()
                    .filter(|&sq| is_square_attacked_by_scan(&position, sq, attacker))
                    .collect();
                assert_eq!(fast, scan, "{fen} attacker {attacker:?}");
            }
        }
    }

    #[test]
    fn sliders_are_blocked() {
        let position = Position::from_fen("4k3/8/8/8/1r2P2K/8/8/8 w - - 0 1").expect("FEN");
        let h4 = square_from_coords(7, 3);
        let f4 = square_from_coords(5, 3);
        let e4 = square_from_coords(4, 3);
        assert!(is_square_attacked(&position, e4, Color::Dark));
        assert!(!is_square_attacked(&position, f4, Color::Dark));
        assert!(!is_king_in_check(&position, Color::Light));
        assert!(!is_square_attacked(&position, h4, Color::Dark));
    }

    #[test]
    fn pawn_attacks_are_directional() {
        let position = Position::from_fen("4k3/8/8/8/4p3/8/8/4K3 w - - 0 1").expect("FEN");
        assert!(is_square_attacked(&position, square_from_coords(3, 2), Color::Dark));
        assert!(is_square_attacked(&position, square_from_coords(5, 2), Color::Dark));
        assert!(!is_square_attacked(&position, square_from_coords(3, 4), Color::Dark));
    }

    #[test]
    fn scan_works_after_raw_edit() {
        let mut position = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN");
        position.set_cell_unchecked(square_from_coords(4, 4), Cell::Piece(Color::Dark, PieceKind::Rook));
        assert!(is_square_attacked_by_scan(&position, E1, Color::Dark));
        position.rebuild_piece_lists();
        assert!(is_king_in_check(&position, Color::Light));
    }
}
