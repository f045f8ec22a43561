use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_shared::{push_piece_move, GenerationMode};
use crate::moves::move_descriptions::MoveList;
use crate::moves::piece_offsets::{BISHOP_DIRECTIONS, QUEEN_DIRECTIONS, ROOK_DIRECTIONS};

/// Bishops, rooks, and queens walk each ray until a piece or the board edge.
pub fn generate_slider_moves(position: &Position, out: &mut MoveList, mode: GenerationMode) {
    let side = position.side_to_move();
    for (kind, directions) in [
        (PieceKind::Bishop, &BISHOP_DIRECTIONS[..]),
        (PieceKind::Rook, &ROOK_DIRECTIONS[..]),
        (PieceKind::Queen, &QUEEN_DIRECTIONS[..]),
    ] {
        for &from in position.pieces(side, kind) {
            for &step in directions {
                let mut to = offset_square(from, step);
                while push_piece_move(position, out, mode, from, to, kind) {
                    to = offset_square(to, step);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_queen_on_open_board() {
        let position = Position::from_fen("k7/8/8/8/3Q4/8/8/7K w - - 0 1").expect("FEN");
        let mut out = MoveList::new();
        generate_slider_moves(&position, &mut out, GenerationMode::All);
        assert_eq!(out.len(), 27);
    }

    #[test]
    fn tactical_mode_keeps_only_captures() {
        let position = Position::from_fen("k7/8/8/3p4/8/8/3R4/7K w - - 0 1").expect("FEN");
        let mut out = MoveList::new();
        generate_slider_moves(&position, &mut out, GenerationMode::Tactical);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].captured(), Some(PieceKind::Pawn));
    }
}
