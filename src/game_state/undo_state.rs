use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::Move;

/// Single undo record for `make_move` / `unmake_move`.
///
/// List slots are recorded so that unmake reinserts removed pieces exactly
/// where they were, keeping piece-list order identical across make/unmake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoState {
    pub mv: Move,
    pub captured_piece: Option<PieceKind>,
    pub captured_slot: u8,
    pub promoted_pawn_slot: u8,

    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_zobrist_key: u64,
}

impl UndoState {
    #[inline]
    pub fn is_null_move(&self) -> bool {
        self.mv.is_null()
    }
}
