//! Full legal move generation pipeline.
//!
//! Generates pseudo-legal moves piece by piece, then keeps only the moves
//! that do not leave the mover's king attacked (make, query, unmake).

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_shared::GenerationMode;
use crate::move_generation::legal_moves_king::generate_king_moves;
use crate::move_generation::legal_moves_knight::generate_knight_moves;
use crate::move_generation::legal_moves_pawn::generate_pawn_moves;
use crate::move_generation::legal_moves_sliders::generate_slider_moves;
use crate::moves::move_descriptions::{Move, MoveList};

pub fn generate_pseudo_legal_moves(position: &Position, out: &mut MoveList, mode: GenerationMode) {
    generate_pawn_moves(position, out, mode);
    generate_knight_moves(position, out, mode);
    generate_slider_moves(position, out, mode);
    generate_king_moves(position, out, mode);
}

/// Every strictly legal move for the side to move. `out` is cleared first.
pub fn generate_legal_moves(position: &mut Position, out: &mut MoveList) {
    generate_filtered(position, out, GenerationMode::All);
}

/// Legal captures, en-passant captures, and promotions.
pub fn generate_legal_captures(position: &mut Position, out: &mut MoveList) {
    generate_filtered(position, out, GenerationMode::Tactical);
}

fn generate_filtered(position: &mut Position, out: &mut MoveList, mode: GenerationMode) {
    out.clear();
    let mut pseudo = MoveList::new();
    generate_pseudo_legal_moves(position, &mut pseudo, mode);

    let side = position.side_to_move();
    for mv in pseudo {
        position.make_move(mv);
        if !is_king_in_check(position, side) {
            out.push(mv);
        }
        position.unmake_move();
    }
}

/// True when playing `mv` puts the opponent in check.
pub fn gives_check(position: &mut Position, mv: Move) -> bool {
    position.make_move(mv);
    let check = position.in_check();
    position.unmake_move();
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;

    #[test]
    fn starting_position_has_20_legal_moves() {
        let mut position = Position::from_fen(STARTING_POSITION_FEN).expect("FEN should parse");
        let mut moves = MoveList::new();
        generate_legal_moves(&mut position, &mut moves);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn pinned_piece_cannot_move_off_line() {
        let mut position =
            Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").expect("FEN should parse");
        let mut moves = MoveList::new();
        generate_legal_moves(&mut position, &mut moves);
        assert!(moves.iter().all(|m| m.moved_piece() == PieceKind::King));
    }

    #[test]
    fn checkmated_side_has_no_moves() {
        let mut position = Position::from_fen("6k1/5Q2/6K1/8/8/8/8/8 b - - 0 1")
            .expect("FEN should parse");
        let mut moves = MoveList::new();
        generate_legal_moves(&mut position, &mut moves);
        assert!(!moves.is_empty());

        let mut mated = Position::from_fen("6k1/6Q1/6K1/8/8/8/8/8 b - - 0 1")
            .expect("FEN should parse");
        generate_legal_moves(&mut mated, &mut moves);
        assert!(moves.is_empty());
        assert!(mated.in_check());
    }

    #[test]
    fn captures_are_a_legal_subset() {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");
        let mut all = MoveList::new();
        let mut captures = MoveList::new();
        generate_legal_moves(&mut position, &mut all);
        generate_legal_captures(&mut position, &mut captures);

        assert_eq!(captures.len(), 8);
        assert!(captures.iter().all(|m| m.is_tactical() && all.contains(m)));
        assert_eq!(all.iter().filter(|m| m.is_tactical()).count(), captures.len());
    }

    #[test]
    fn gives_check_detects_checking_move() {
        let mut position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").expect("FEN");
        let mut moves = MoveList::new();
        generate_legal_moves(&mut position, &mut moves);
        let checks = moves
            .iter()
            .filter(|m| gives_check(&mut position, **m))
            .count();
        // Only Ra8+.
        assert_eq!(checks, 1);
    }
}
