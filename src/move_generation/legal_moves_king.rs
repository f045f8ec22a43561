use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::move_generation::legal_move_shared::{push_piece_move, GenerationMode};
use crate::moves::move_descriptions::{Move, MoveFlag, MoveList};
use crate::moves::piece_offsets::KING_OFFSETS;

pub fn generate_king_moves(position: &Position, out: &mut MoveList, mode: GenerationMode) {
    let side = position.side_to_move();
    let from = position.king_square(side);
    if from == NO_SQUARE {
        return;
    }

    for delta in KING_OFFSETS {
        push_piece_move(position, out, mode, from, offset_square(from, delta), PieceKind::King);
    }

    if mode == GenerationMode::All {
        generate_castling_moves(position, out, from);
    }
}

struct CastleLane {
    right: CastlingRights,
    king_from: Square,
    king_to: Square,
    rook_from: Square,
    transit: Square,
    must_be_empty: &'static [Square],
}

const LIGHT_LANES: [CastleLane; 2] = [
    CastleLane {
        right: CASTLE_LIGHT_KINGSIDE,
        king_from: E1,
        king_to: G1,
        rook_from: H1,
        transit: F1,
        must_be_empty: &[F1, G1],
    },
    CastleLane {
        right: CASTLE_LIGHT_QUEENSIDE,
        king_from: E1,
        king_to: C1,
        rook_from: A1,
        transit: D1,
        must_be_empty: &[B1, C1, D1],
    },
];

const DARK_LANES: [CastleLane; 2] = [
    CastleLane {
        right: CASTLE_DARK_KINGSIDE,
        king_from: E8,
        king_to: G8,
        rook_from: H8,
        transit: F8,
        must_be_empty: &[F8, G8],
    },
    CastleLane {
        right: CASTLE_DARK_QUEENSIDE,
        king_from: E8,
        king_to: C8,
        rook_from: A8,
        transit: D8,
        must_be_empty: &[B8, C8, D8],
    },
];

/// Rights, empty path, and rook presence are checked first; attack queries
/// run only for lanes that pass them.
fn generate_castling_moves(position: &Position, out: &mut MoveList, king_from: Square) {
    let side = position.side_to_move();
    let enemy = side.opposite();
    let lanes = match side {
        Color::Light => &LIGHT_LANES,
        Color::Dark => &DARK_LANES,
    };

    let mut open = [false; 2];
    for (i, lane) in lanes.iter().enumerate() {
        open[i] = king_from == lane.king_from
            && position.castling_rights() & lane.right != 0
            && position.piece_at(lane.rook_from).is(side, PieceKind::Rook)
            && lane
                .must_be_empty
                .iter()
                .all(|&sq| position.piece_at(sq).is_empty());
    }
    if !open.iter().any(|&o| o) {
        return;
    }

    if is_square_attacked(position, king_from, enemy) {
        return;
    }

    for (lane, _) in lanes.iter().zip(open).filter(|(_, o)| *o) {
        if !is_square_attacked(position, lane.transit, enemy)
            && !is_square_attacked(position, lane.king_to, enemy)
        {
            out.push(Move::new(
                king_from,
                lane.king_to,
                PieceKind::King,
                None,
                None,
                MoveFlag::Castle,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn castles(fen: &str) -> Vec<Square> {
        let position = Position::from_fen(fen).expect("FEN should parse");
        let mut out = MoveList::new();
        generate_king_moves(&position, &mut out, GenerationMode::All);
        out.iter().filter(|m| m.is_castle()).map(|m| m.to()).collect()
    }

    #[test]
    fn both_sides_available_when_clear() {
        assert_eq!(castles("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"), vec![G1, C1]);
        assert_eq!(castles("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1"), vec![G8, C8]);
    }

    #[test]
    fn no_castling_out_of_or_through_check() {
        assert!(castles("r3k2r/8/8/8/8/8/8/R3K2r w KQkq - 0 1").is_empty());
        assert!(castles("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").len() == 2);
        assert!(castles("4k3/8/8/8/4r3/8/8/R3K2R w KQ - 0 1").is_empty());
        assert_eq!(castles("4k3/8/8/8/5r2/8/8/R3K2R w KQ - 0 1"), vec![C1]);
    }

    #[test]
    fn queenside_b_file_may_be_attacked_but_not_occupied() {
        assert_eq!(castles("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1"), vec![C1]);
        assert!(castles("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1").is_empty());
    }

    #[test]
    fn missing_rook_blocks_castling() {
        assert!(castles("4k3/8/8/8/8/8/8/4K2B w K - 0 1").is_empty());
    }
}
