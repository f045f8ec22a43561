//! Mailbox board representation with reversible incremental updates.
//!
//! `Position` keeps a 120-cell padded board, per-color/per-kind piece lists
//! with a reverse slot index, a king cache, material totals, and a Zobrist
//! key. `make_move`/`unmake_move` update all of them in O(1) and must nest
//! in strict stack order.

use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::*;
use crate::game_state::undo_state::UndoState;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::moves::move_descriptions::Move;
use crate::search::zobrist::{
    castling_key, compute_zobrist_key, en_passant_key, piece_square_key, side_to_move_key,
};
use crate::errors::FenError;

/// Eight pawns can promote, so ten of one kind is reachable.
pub const MAX_PIECES_PER_KIND: usize = 10;

type PieceLists = [[[Square; MAX_PIECES_PER_KIND]; 6]; 2];

/// Rights kept after a move touches a square, `CastlingRights & MASK[from] & MASK[to]`.
const CASTLE_MASK: [CastlingRights; BOARD_SQUARES] = build_castle_mask();

const fn build_castle_mask() -> [CastlingRights; BOARD_SQUARES] {
    let mut mask = [CASTLE_ALL; BOARD_SQUARES];
    mask[A1 as usize] = CASTLE_ALL & !CASTLE_LIGHT_QUEENSIDE;
    mask[E1 as usize] = CASTLE_ALL & !(CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE);
    mask[H1 as usize] = CASTLE_ALL & !CASTLE_LIGHT_KINGSIDE;
    mask[A8 as usize] = CASTLE_ALL & !CASTLE_DARK_QUEENSIDE;
    mask[E8 as usize] = CASTLE_ALL & !(CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
    mask[H8 as usize] = CASTLE_ALL & !CASTLE_DARK_KINGSIDE;
    mask
}

/// Rook `(from, to)` for a castling king landing on `king_to`.
#[inline]
pub const fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to {
        G1 => (H1, F1),
        C1 => (A1, D1),
        G8 => (H8, F8),
        _ => (A8, D8),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: [Cell; BOARD_SQUARES],
    piece_list: PieceLists,
    piece_count: [[u8; 6]; 2],
    list_slot: [u8; BOARD_SQUARES],
    king_square: [Square; 2],
    material: [i32; 2],

    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    pub(crate) en_passant_square: Option<Square>,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    pub(crate) zobrist_key: u64,

    history: Vec<UndoState>,
    lists_stale: bool,
}

impl Position {
    /// Board with every playable square empty and no rights.
    pub fn new_empty() -> Self {
        let mut board = [Cell::OffBoard; BOARD_SQUARES];
        for sq in playable_squares() {
            board[sq as usize] = Cell::Empty;
        }

        let mut position = Self {
            board,
            piece_list: [[[NO_SQUARE; MAX_PIECES_PER_KIND]; 6]; 2],
            piece_count: [[0; 6]; 2],
            list_slot: [0; BOARD_SQUARES],
            king_square: [NO_SQUARE; 2],
            material: [0; 2],
            side_to_move: Color::Light,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            zobrist_key: 0,
            history: Vec::with_capacity(256),
            lists_stale: false,
        };
        position.refresh_zobrist_key();
        position
    }

    /// Standard initial position.
    pub fn new_game() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut position = Self::new_empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            position.add_piece(square_from_coords(file, 0), Color::Light, *kind);
            position.add_piece(square_from_coords(file, 1), Color::Light, PieceKind::Pawn);
            position.add_piece(square_from_coords(file, 6), Color::Dark, PieceKind::Pawn);
            position.add_piece(square_from_coords(file, 7), Color::Dark, *kind);
        }
        position.castling_rights = CASTLE_ALL;
        position.refresh_zobrist_key();
        debug_assert_eq!(position.to_fen(), STARTING_POSITION_FEN);
        position
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        crate::utils::fen_parser::parse_fen(fen)
    }

    pub fn to_fen(&self) -> String {
        crate::utils::fen_generator::generate_fen(self)
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Cell {
        self.board[square as usize]
    }

    /// Squares occupied by `color`'s pieces of `kind`, in list order.
    #[inline]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> &[Square] {
        let count = self.piece_count[color.index()][kind.index()] as usize;
        &self.piece_list[color.index()][kind.index()][..count]
    }

    #[inline]
    pub fn piece_count(&self, color: Color, kind: PieceKind) -> usize {
        self.piece_count[color.index()][kind.index()] as usize
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_square[color.index()]
    }

    /// Sum of non-king piece values for `color`.
    #[inline]
    pub fn material(&self, color: Color) -> i32 {
        self.material[color.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[inline]
    pub fn zobrist_key(&self) -> u64 {
        self.zobrist_key
    }

    #[inline]
    pub fn history(&self) -> &[UndoState] {
        &self.history
    }

    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|undo| undo.mv)
    }

    /// True when a raw board edit left the piece lists out of sync.
    #[inline]
    pub fn piece_lists_stale(&self) -> bool {
        self.lists_stale
    }

    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ]
        .into_iter()
        .any(|kind| self.piece_count(color, kind) > 0)
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        is_king_in_check(self, self.side_to_move)
    }

    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// True when the current position occurred before with the same side to
    /// move since the last irreversible move.
    pub fn is_repetition(&self) -> bool {
        let len = self.history.len();
        let window = usize::from(self.halfmove_clock).min(len);
        let mut back = 2;
        while back <= window {
            if self.history[len - back].prev_zobrist_key == self.zobrist_key {
                return true;
            }
            back += 2;
        }
        false
    }

    /// Neither side can ever deliver mate: bare kings, or kings plus one minor.
    pub fn has_insufficient_material(&self) -> bool {
        let mut minors = 0;
        for color in Color::ALL {
            if self.piece_count(color, PieceKind::Pawn) > 0
                || self.piece_count(color, PieceKind::Rook) > 0
                || self.piece_count(color, PieceKind::Queen) > 0
            {
                return false;
            }
            minors += self.piece_count(color, PieceKind::Knight)
                + self.piece_count(color, PieceKind::Bishop);
        }
        minors <= 1
    }

    /// Apply a legal move and return its undo record (also kept internally).
    pub fn make_move(&mut self, mv: Move) -> UndoState {
        let us = self.side_to_move;
        let them = us.opposite();
        let from = mv.from();
        let to = mv.to();
        let moved = mv.moved_piece();
        debug_assert!(self.board[from as usize].is(us, moved), "make_move: {mv:?} does not match board");

        let mut undo = UndoState {
            mv,
            captured_piece: None,
            captured_slot: 0,
            promoted_pawn_slot: 0,
            prev_castling_rights: self.castling_rights,
            prev_en_passant_square: self.en_passant_square,
            prev_halfmove_clock: self.halfmove_clock,
            prev_zobrist_key: self.zobrist_key,
        };

        if let Some(ep) = self.en_passant_square.take() {
            self.zobrist_key ^= en_passant_key(ep);
        }
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);

        if mv.is_en_passant() {
            let capture_square = offset_square(to, -us.pawn_push());
            undo.captured_slot = self.remove_piece(capture_square, them, PieceKind::Pawn);
            undo.captured_piece = Some(PieceKind::Pawn);
        } else if let Some((_, captured)) = self.board[to as usize].piece() {
            undo.captured_slot = self.remove_piece(to, them, captured);
            undo.captured_piece = Some(captured);
        }
        if undo.captured_piece.is_some() || moved == PieceKind::Pawn {
            self.halfmove_clock = 0;
        }

        if mv.is_castle() {
            let (rook_from, rook_to) = castle_rook_squares(to);
            self.relocate_piece(rook_from, rook_to, us, PieceKind::Rook);
        }

        self.relocate_piece(from, to, us, moved);

        if let Some(promotion) = mv.promotion() {
            undo.promoted_pawn_slot = self.remove_piece(to, us, PieceKind::Pawn);
            self.add_piece(to, us, promotion);
        }

        self.zobrist_key ^= castling_key(self.castling_rights);
        self.castling_rights &= CASTLE_MASK[from as usize] & CASTLE_MASK[to as usize];
        self.zobrist_key ^= castling_key(self.castling_rights);

        if mv.is_double_pawn_push() {
            let ep = offset_square(from, us.pawn_push());
            self.en_passant_square = Some(ep);
            self.zobrist_key ^= en_passant_key(ep);
        }

        if us == Color::Dark {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = them;
        self.zobrist_key ^= side_to_move_key();

        self.history.push(undo);
        undo
    }

    /// Reverse the most recent `make_move`.
    ///
    /// # Panics
    /// Panics if there is no matching `make_move` on the history stack.
    pub fn unmake_move(&mut self) {
        let Some(undo) = self.history.pop() else {
            panic!("unmake_move called without a matching make_move");
        };
        assert!(!undo.is_null_move(), "unmake_move called on a null move record");

        let mv = undo.mv;
        let them = self.side_to_move;
        let us = them.opposite();
        let from = mv.from();
        let to = mv.to();

        self.side_to_move = us;
        if us == Color::Dark {
            self.fullmove_number = self.fullmove_number.saturating_sub(1);
        }

        if let Some(promotion) = mv.promotion() {
            self.remove_piece(to, us, promotion);
            self.insert_piece(to, us, PieceKind::Pawn, undo.promoted_pawn_slot);
        }

        self.relocate_piece(to, from, us, mv.moved_piece());

        if mv.is_castle() {
            let (rook_from, rook_to) = castle_rook_squares(to);
            self.relocate_piece(rook_to, rook_from, us, PieceKind::Rook);
        }

        if let Some(captured) = undo.captured_piece {
            let capture_square = if mv.is_en_passant() {
                offset_square(to, -us.pawn_push())
            } else {
                to
            };
            self.insert_piece(capture_square, them, captured, undo.captured_slot);
        }

        self.castling_rights = undo.prev_castling_rights;
        self.en_passant_square = undo.prev_en_passant_square;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.zobrist_key = undo.prev_zobrist_key;
    }

    /// Pass the turn without moving. The null record acts as a repetition
    /// barrier by zeroing the half-move clock until it is unmade.
    pub fn make_null_move(&mut self) {
        let undo = UndoState {
            mv: Move::NULL,
            captured_piece: None,
            captured_slot: 0,
            promoted_pawn_slot: 0,
            prev_castling_rights: self.castling_rights,
            prev_en_passant_square: self.en_passant_square,
            prev_halfmove_clock: self.halfmove_clock,
            prev_zobrist_key: self.zobrist_key,
        };

        if let Some(ep) = self.en_passant_square.take() {
            self.zobrist_key ^= en_passant_key(ep);
        }
        self.halfmove_clock = 0;
        self.side_to_move = self.side_to_move.opposite();
        self.zobrist_key ^= side_to_move_key();
        self.history.push(undo);
    }

    /// # Panics
    /// Panics unless the most recent record came from `make_null_move`.
    pub fn unmake_null_move(&mut self) {
        let Some(undo) = self.history.pop() else {
            panic!("unmake_null_move called without a matching make_null_move");
        };
        assert!(undo.is_null_move(), "unmake_null_move called on a real move record");

        self.side_to_move = self.side_to_move.opposite();
        self.en_passant_square = undo.prev_en_passant_square;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.zobrist_key = undo.prev_zobrist_key;
    }

    /// Color-flipped copy: ranks mirrored, colors swapped, rights swapped.
    /// History is not carried over.
    pub fn mirrored(&self) -> Self {
        let mut out = Self::new_empty();
        for sq in playable_squares() {
            if let Some((color, kind)) = self.piece_at(sq).piece() {
                out.add_piece(mirror_square(sq), color.opposite(), kind);
            }
        }
        out.side_to_move = self.side_to_move.opposite();
        out.castling_rights =
            ((self.castling_rights & 0x03) << 2) | ((self.castling_rights >> 2) & 0x03);
        out.en_passant_square = self.en_passant_square.map(mirror_square);
        out.halfmove_clock = self.halfmove_clock;
        out.fullmove_number = self.fullmove_number;
        out.refresh_zobrist_key();
        out
    }

    /// Incrementally place a piece on an empty playable square.
    pub(crate) fn add_piece(&mut self, square: Square, color: Color, kind: PieceKind) {
        let slot = self.piece_count[color.index()][kind.index()];
        self.insert_piece(square, color, kind, slot);
    }

    /// Raw board edit that bypasses piece lists, material and hash.
    /// Call [`Position::rebuild_piece_lists`] before searching again.
    pub fn set_cell_unchecked(&mut self, square: Square, cell: Cell) {
        if !is_playable(square) {
            return;
        }
        self.board[square as usize] = cell;
        self.lists_stale = true;
    }

    /// Rebuild lists, king cache, material and hash from the board array.
    pub fn rebuild_piece_lists(&mut self) {
        self.piece_list = [[[NO_SQUARE; MAX_PIECES_PER_KIND]; 6]; 2];
        self.piece_count = [[0; 6]; 2];
        self.list_slot = [0; BOARD_SQUARES];
        self.king_square = [NO_SQUARE; 2];
        self.material = [0; 2];

        for sq in playable_squares() {
            if let Some((color, kind)) = self.board[sq as usize].piece() {
                let c = color.index();
                let k = kind.index();
                let slot = self.piece_count[c][k] as usize;
                if slot >= MAX_PIECES_PER_KIND {
                    continue;
                }
                self.piece_list[c][k][slot] = sq;
                self.list_slot[sq as usize] = slot as u8;
                self.piece_count[c][k] += 1;
                self.material[c] += kind.value();
                if kind == PieceKind::King {
                    self.king_square[c] = sq;
                }
            }
        }
        self.lists_stale = false;
        self.refresh_zobrist_key();
    }

    #[inline]
    pub fn refresh_zobrist_key(&mut self) {
        self.zobrist_key = compute_zobrist_key(self);
    }

    /// Check every derived field against a recomputation from the board.
    pub fn verify_integrity(&self) -> Result<(), String> {
        if self.lists_stale {
            return Err("piece lists are marked stale".to_owned());
        }

        let expected_key = compute_zobrist_key(self);
        if expected_key != self.zobrist_key {
            return Err(format!(
                "zobrist mismatch: incremental={:#018x}, recomputed={expected_key:#018x}",
                self.zobrist_key
            ));
        }

        let mut material = [0i32; 2];
        let mut counts = [[0u8; 6]; 2];
        for sq in playable_squares() {
            let Some((color, kind)) = self.board[sq as usize].piece() else {
                continue;
            };
            counts[color.index()][kind.index()] += 1;
            material[color.index()] += kind.value();

            let slot = self.list_slot[sq as usize] as usize;
            if self.piece_list[color.index()][kind.index()][slot] != sq {
                return Err(format!("square {sq} is not at its recorded list slot {slot}"));
            }
            if kind == PieceKind::King && self.king_square[color.index()] != sq {
                return Err(format!("king cache for {color:?} does not match square {sq}"));
            }
        }

        if counts != self.piece_count {
            return Err(format!(
                "piece counts mismatch: lists={:?}, board={counts:?}",
                self.piece_count
            ));
        }
        if material != self.material {
            return Err(format!(
                "material mismatch: incremental={:?}, board={material:?}",
                self.material
            ));
        }
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for &sq in self.pieces(color, kind) {
                    if !self.board[sq as usize].is(color, kind) {
                        return Err(format!("list entry {sq} for {color:?} {kind:?} is not on the board"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Insert at a given list slot; the inverse of [`Position::remove_piece`].
    fn insert_piece(&mut self, square: Square, color: Color, kind: PieceKind, slot: u8) {
        debug_assert!(self.board[square as usize].is_empty());
        let c = color.index();
        let k = kind.index();
        let count = self.piece_count[c][k];
        let list = &mut self.piece_list[c][k];

        if slot < count {
            let displaced = list[slot as usize];
            list[count as usize] = displaced;
            self.list_slot[displaced as usize] = count;
        }
        list[slot as usize] = square;
        self.list_slot[square as usize] = slot;
        self.piece_count[c][k] = count + 1;

        self.board[square as usize] = Cell::Piece(color, kind);
        self.material[c] += kind.value();
        if kind == PieceKind::King {
            self.king_square[c] = square;
        }
        self.zobrist_key ^= piece_square_key(color, kind, square);
    }

    /// Swap-remove from the piece list; returns the slot the piece occupied.
    fn remove_piece(&mut self, square: Square, color: Color, kind: PieceKind) -> u8 {
        debug_assert!(self.board[square as usize].is(color, kind));
        let c = color.index();
        let k = kind.index();
        let slot = self.list_slot[square as usize];
        let last = self.piece_count[c][k] - 1;
        let list = &mut self.piece_list[c][k];

        let moved = list[last as usize];
        list[slot as usize] = moved;
        list[last as usize] = NO_SQUARE;
        self.list_slot[moved as usize] = slot;
        self.list_slot[square as usize] = 0;
        self.piece_count[c][k] = last;

        self.board[square as usize] = Cell::Empty;
        self.material[c] -= kind.value();
        self.zobrist_key ^= piece_square_key(color, kind, square);
        slot
    }

    fn relocate_piece(&mut self, from: Square, to: Square, color: Color, kind: PieceKind) {
        debug_assert!(self.board[to as usize].is_empty());
        let slot = self.list_slot[from as usize];
        self.piece_list[color.index()][kind.index()][slot as usize] = to;
        self.list_slot[to as usize] = slot;
        self.list_slot[from as usize] = 0;

        self.board[to as usize] = self.board[from as usize];
        self.board[from as usize] = Cell::Empty;
        if kind == PieceKind::King {
            self.king_square[color.index()] = to;
        }
        self.zobrist_key ^= piece_square_key(color, kind, from) ^ piece_square_key(color, kind, to);
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new_game()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_generator::generate_legal_moves;
    use crate::moves::move_descriptions::MoveList;
    use crate::utils::long_algebraic::long_algebraic_to_move;

    const SYMMETRY_FENS: &[&str] = &[
        STARTING_POSITION_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
    ];

    fn play(position: &mut Position, lan: &str) {
        let mv = long_algebraic_to_move(lan, position).expect("move should be legal");
        position.make_move(mv);
    }

    #[test]
    fn new_game_matches_starting_fen() {
        let a = Position::new_game();
        let b = Position::from_fen(STARTING_POSITION_FEN).expect("FEN should parse");
        assert_eq!(a, b);
        assert_eq!(a.material(Color::Light), 8 * 100 + 2 * 320 + 2 * 330 + 2 * 500 + 900);
        a.verify_integrity().expect("integrity");
    }

    #[test]
    fn make_unmake_restores_identical_position_for_every_legal_move() {
        for fen in SYMMETRY_FENS {
            let mut position = Position::from_fen(fen).expect("FEN should parse");
            let before = position.clone();
            let mut moves = MoveList::new();
            generate_legal_moves(&mut position, &mut moves);
            assert!(!moves.is_empty());

            for mv in moves {
                let undo = position.make_move(mv);
                assert_eq!(undo.mv, mv);
                position
                    .verify_integrity()
                    .unwrap_or_else(|e| panic!("{fen} after {mv}: {e}"));
                position.unmake_move();
                assert_eq!(position, before, "{fen}: make/unmake of {mv} changed state");
            }
        }
    }

    #[test]
    fn castling_moves_rook_and_revokes_rights() {
        let mut position =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        play(&mut position, "e1g1");
        assert!(position.piece_at(F1).is(Color::Light, PieceKind::Rook));
        assert!(position.piece_at(H1).is_empty());
        assert_eq!(position.king_square(Color::Light), G1);
        assert_eq!(position.castling_rights(), CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);

        play(&mut position, "a8a1");
        assert_eq!(position.castling_rights(), CASTLE_DARK_KINGSIDE);
        position.verify_integrity().expect("integrity");
    }

    #[test]
    fn en_passant_removes_pawn_behind_destination() {
        let mut position = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1")
            .expect("FEN should parse");
        play(&mut position, "e5d6");
        assert!(position.piece_at(square_from_coords(3, 4)).is_empty());
        assert!(position.piece_at(square_from_coords(3, 5)).is(Color::Light, PieceKind::Pawn));
        assert_eq!(position.piece_count(Color::Dark, PieceKind::Pawn), 0);
        assert_eq!(position.halfmove_clock(), 0);
        position.verify_integrity().expect("integrity");
    }

    #[test]
    fn promotion_swaps_piece_lists() {
        let mut position =
            Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 5 40").expect("FEN should parse");
        play(&mut position, "a7a8q");
        assert_eq!(position.piece_count(Color::Light, PieceKind::Pawn), 0);
        assert_eq!(position.pieces(Color::Light, PieceKind::Queen), &[A8]);
        assert_eq!(position.material(Color::Light), 900);
        assert_eq!(position.halfmove_clock(), 0);
        position.unmake_move();
        assert_eq!(position.material(Color::Light), 100);
    }

    #[test]
    fn halfmove_clock_resets_only_on_pawn_moves_and_captures() {
        let mut position = Position::new_game();
        play(&mut position, "g1f3");
        assert_eq!(position.halfmove_clock(), 1);
        play(&mut position, "g8f6");
        assert_eq!(position.halfmove_clock(), 2);
        play(&mut position, "e2e4");
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.en_passant_square(), Some(square_from_coords(4, 2)));
        assert_eq!(position.fullmove_number(), 2);
    }

    #[test]
    fn fifty_move_draw_starts_at_one_hundred_half_moves() {
        let mut position =
            Position::from_fen("4k3/8/8/8/8/8/4P3/R3K3 w - - 99 80").expect("FEN should parse");
        assert!(!position.is_fifty_move_draw());
        play(&mut position, "a1a2");
        assert_eq!(position.halfmove_clock(), 100);
        assert!(position.is_fifty_move_draw());
        position.unmake_move();
        assert!(!position.is_fifty_move_draw());

        play(&mut position, "e2e4");
        assert!(!position.is_fifty_move_draw());
    }

    #[test]
    fn repetition_is_detected_after_knight_shuffle() {
        let mut position = Position::new_game();
        for lan in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            assert!(!position.is_repetition());
            play(&mut position, lan);
        }
        assert!(position.is_repetition());
    }

    #[test]
    fn null_move_round_trip() {
        let mut position = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1")
            .expect("FEN should parse");
        let before = position.clone();
        position.make_null_move();
        assert_eq!(position.side_to_move(), Color::Dark);
        assert_eq!(position.en_passant_square(), None);
        position.verify_integrity().expect("integrity");
        position.unmake_null_move();
        assert_eq!(position, before);
    }

    #[test]
    #[should_panic(expected = "without a matching make_move")]
    fn unmake_without_make_panics() {
        let mut position = Position::new_game();
        position.unmake_move();
    }

    #[test]
    fn mirrored_position_swaps_colors() {
        let position = Position::from_fen("r3k2r/pp6/8/8/8/8/6PP/R3K2R w Kq - 0 1")
            .expect("FEN should parse");
        let mirrored = position.mirrored();
        assert_eq!(mirrored.to_fen(), "r3k2r/6pp/8/8/8/8/PP6/R3K2R b Qk - 0 1");
        assert_eq!(mirrored.mirrored(), position);
        mirrored.verify_integrity().expect("integrity");
    }

    #[test]
    fn raw_edits_mark_lists_stale_until_rebuilt() {
        let mut position = Position::new_game();
        position.set_cell_unchecked(square_from_coords(4, 3), Cell::Piece(Color::Dark, PieceKind::Queen));
        assert!(position.piece_lists_stale());
        assert!(position.verify_integrity().is_err());
        position.rebuild_piece_lists();
        assert!(!position.piece_lists_stale());
        assert_eq!(position.piece_count(Color::Dark, PieceKind::Queen), 2);
        position.verify_integrity().expect("integrity");
    }

    #[test]
    fn insufficient_material_detection() {
        let bare = Position::from_fen("8/8/4k3/8/8/3NK3/8/8 w - - 0 1").expect("FEN");
        assert!(bare.has_insufficient_material());
        let rook = Position::from_fen("8/8/4k3/8/8/3RK3/8/8 w - - 0 1").expect("FEN");
        assert!(!rook.has_insufficient_material());
    }
}
