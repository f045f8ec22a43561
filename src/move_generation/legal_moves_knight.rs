use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_shared::{push_piece_move, GenerationMode};
use crate::moves::move_descriptions::MoveList;
use crate::moves::piece_offsets::KNIGHT_OFFSETS;

pub fn generate_knight_moves(position: &Position, out: &mut MoveList, mode: GenerationMode) {
    let side = position.side_to_move();
    for &from in position.pieces(side, PieceKind::Knight) {
        for delta in KNIGHT_OFFSETS {
            let to = offset_square(from, delta);
            push_piece_move(position, out, mode, from, to, PieceKind::Knight);
        }
    }
}
