use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::{Move, MoveFlag, MoveList};

/// Which pseudo-legal moves a generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Every pseudo-legal move.
    All,
    /// Captures, en-passant captures, and promotions only.
    Tactical,
}

/// Emit a move to `to` for a non-pawn piece unless the square is blocked.
/// Returns true when a sliding ray may continue past `to`.
#[inline]
pub fn push_piece_move(
    position: &Position,
    out: &mut MoveList,
    mode: GenerationMode,
    from: Square,
    to: Square,
    kind: PieceKind,
) -> bool {
    match position.piece_at(to) {
        Cell::Empty => {
            if mode == GenerationMode::All {
                out.push(Move::new(from, to, kind, None, None, MoveFlag::Quiet));
            }
            true
        }
        Cell::Piece(color, captured) if color != position.side_to_move() => {
            out.push(Move::new(from, to, kind, Some(captured), None, MoveFlag::Quiet));
            false
        }
        _ => false,
    }
}
