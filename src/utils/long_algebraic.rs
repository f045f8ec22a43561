//! Long algebraic (UCI) move text.

use crate::errors::MoveParseError;
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_generator::generate_legal_moves;
use crate::moves::move_descriptions::{Move, MoveList};
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

pub fn move_to_long_algebraic(mv: Move) -> String {
    let mut out = String::with_capacity(5);
    out.push_str(&square_to_algebraic(mv.from()));
    out.push_str(&square_to_algebraic(mv.to()));
    if let Some(promotion) = mv.promotion() {
        out.push(promotion.fen_char(Color::Dark));
    }
    out
}

/// Resolve `long_algebraic` against the legal moves of `position`.
///
/// Flags such as capture, en passant, and castling come from the matching
/// generated move, so the text only has to name squares and promotion.
pub fn long_algebraic_to_move(
    long_algebraic: &str,
    position: &mut Position,
) -> Result<Move, MoveParseError> {
    if !long_algebraic.is_ascii() || !(4..=5).contains(&long_algebraic.len()) {
        return Err(MoveParseError::BadFormat(long_algebraic.to_owned()));
    }

    let from = algebraic_to_square(&long_algebraic[0..2])?;
    let to = algebraic_to_square(&long_algebraic[2..4])?;
    let promotion = match long_algebraic[4..].chars().next() {
        None => None,
        Some(ch) => match PieceKind::from_fen_char(ch.to_ascii_lowercase()) {
            Some((_, kind)) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
            _ => return Err(MoveParseError::BadFormat(long_algebraic.to_owned())),
        },
    };

    let mut moves = MoveList::new();
    generate_legal_moves(position, &mut moves);
    moves
        .into_iter()
        .find(|mv| mv.from() == from && mv.to() == to && mv.promotion() == promotion)
        .ok_or_else(|| MoveParseError::Illegal(long_algebraic.to_owned()))
}
