use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_shared::GenerationMode;
use crate::moves::move_descriptions::{Move, MoveFlag, MoveList};
use crate::moves::piece_offsets::PAWN_CAPTURE_OFFSETS;

/// Pseudo-legal pawn moves: pushes, double pushes, captures, en passant, and
/// promotions (every promotion is tactical).
pub fn generate_pawn_moves(position: &Position, out: &mut MoveList, mode: GenerationMode) {
    let side = position.side_to_move();
    let push = side.pawn_push();
    let (start_rank, promotion_rank) = match side {
        Color::Light => (1, 7),
        Color::Dark => (6, 0),
    };

    for &from in position.pieces(side, PieceKind::Pawn) {
        let one = offset_square(from, push);
        if position.piece_at(one).is_empty() {
            if rank_of(one) == promotion_rank {
                push_promotions(out, from, one, None);
            } else if mode == GenerationMode::All {
                out.push(Move::new(from, one, PieceKind::Pawn, None, None, MoveFlag::Quiet));

                let two = offset_square(one, push);
                if rank_of(from) == start_rank && position.piece_at(two).is_empty() {
                    out.push(Move::new(
                        from,
                        two,
                        PieceKind::Pawn,
                        None,
                        None,
                        MoveFlag::DoublePawnPush,
                    ));
                }
            }
        }

        for delta in PAWN_CAPTURE_OFFSETS[side.index()] {
            let to = offset_square(from, delta);
            match position.piece_at(to) {
                Cell::Piece(color, captured) if color != side => {
                    if rank_of(to) == promotion_rank {
                        push_promotions(out, from, to, Some(captured));
                    } else {
                        out.push(Move::new(
                            from,
                            to,
                            PieceKind::Pawn,
                            Some(captured),
                            None,
                            MoveFlag::Quiet,
                        ));
                    }
                }
                Cell::Empty if position.en_passant_square() == Some(to) => {
                    out.push(Move::new(
                        from,
                        to,
                        PieceKind::Pawn,
                        Some(PieceKind::Pawn),
                        None,
                        MoveFlag::EnPassant,
                    ));
                }
                _ => {}
            }
        }
    }
}

#[inline]
fn push_promotions(out: &mut MoveList, from: Square, to: Square, captured: Option<PieceKind>) {
    for promotion in PieceKind::PROMOTIONS {
        out.push(Move::new(
            from,
            to,
            PieceKind::Pawn,
            captured,
            Some(promotion),
            MoveFlag::Quiet,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pawn_moves(fen: &str, mode: GenerationMode) -> MoveList {
        let position = Position::from_fen(fen).expect("FEN should parse");
        let mut out = MoveList::new();
        generate_pawn_moves(&position, &mut out, mode);
        out
    }

    #[test]
    fn start_position_has_sixteen_pawn_moves() {
        let moves = pawn_moves(crate::game_state::chess_rules::STARTING_POSITION_FEN, GenerationMode::All);
        assert_eq!(moves.len(), 16);
        assert_eq!(moves.iter().filter(|m| m.is_double_pawn_push()).count(), 8);
    }

    #[test]
    fn promotions_cover_four_pieces_and_are_tactical() {
        let moves = pawn_moves("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1", GenerationMode::Tactical);
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|m| m.is_promotion()));
        assert_eq!(moves.iter().filter(|m| m.is_capture()).count(), 4);
    }

    #[test]
    fn en_passant_is_generated_for_dark() {
        let moves = pawn_moves("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1", GenerationMode::Tactical);
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_en_passant());
        assert_eq!(moves[0].to(), square_from_coords(4, 2));
    }
}
