//! FEN-to-Position parser.
//!
//! Builds fully-populated incremental state from a Forsyth-Edwards Notation
//! string, including piece lists, rights, clocks, and the Zobrist key, and
//! rejects positions that cannot arise in a legal game.

use crate::errors::FenError;
use crate::game_state::chess_types::*;
use crate::game_state::game_state::MAX_PIECES_PER_KIND;
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> Result<Position, FenError> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or(FenError::MissingField("board"))?;
    let side_part = parts.next().ok_or(FenError::MissingField("side-to-move"))?;
    let castling_part = parts.next().ok_or(FenError::MissingField("castling"))?;
    let en_passant_part = parts.next().ok_or(FenError::MissingField("en-passant"))?;
    // Clocks are optional in many EPD-derived strings.
    let halfmove_part = parts.next().unwrap_or("0");
    let fullmove_part = parts.next().unwrap_or("1");

    if parts.next().is_some() {
        return Err(FenError::TrailingFields);
    }

    let mut position = Position::new_empty();

    parse_board(board_part, &mut position)?;
    position.side_to_move = parse_side_to_move(side_part)?;
    position.castling_rights = sanitize_castling(&position, parse_castling_rights(castling_part)?);
    position.en_passant_square = parse_en_passant_square(en_passant_part, position.side_to_move)?;
    position.halfmove_clock = halfmove_part.parse::<u16>().map_err(|_| FenError::BadClock {
        field: "halfmove",
        value: halfmove_part.to_owned(),
    })?;
    position.fullmove_number = fullmove_part.parse::<u16>().map_err(|_| FenError::BadClock {
        field: "fullmove",
        value: fullmove_part.to_owned(),
    })?;
    position.refresh_zobrist_key();

    validate(&position)?;
    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), FenError> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::BadBoardLayout(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(FenError::BadBoardLayout(format!(
                        "invalid empty-square count '{ch}'"
                    )));
                }
                file += empty_count as u8;
                if file > 8 {
                    return Err(FenError::BadBoardLayout(format!(
                        "rank {} has more than 8 files",
                        rank + 1
                    )));
                }
                continue;
            }

            let (color, kind) = PieceKind::from_fen_char(ch).ok_or(FenError::BadPieceChar(ch))?;
            if file >= 8 {
                return Err(FenError::BadBoardLayout(format!(
                    "rank {} has more than 8 files",
                    rank + 1
                )));
            }
            if position.piece_count(color, kind) >= MAX_PIECES_PER_KIND {
                return Err(FenError::IllegalPosition(format!(
                    "too many {color:?} {kind:?} pieces"
                )));
            }

            position.add_piece(square_from_coords(file, rank), color, kind);
            file += 1;
        }

        if file != 8 {
            return Err(FenError::BadBoardLayout(format!(
                "rank {} does not sum to 8 files",
                rank + 1
            )));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, FenError> {
    match side_part {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(FenError::BadSideToMove(side_part.to_owned())),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, FenError> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_LIGHT_KINGSIDE,
            'Q' => rights |= CASTLE_LIGHT_QUEENSIDE,
            'k' => rights |= CASTLE_DARK_KINGSIDE,
            'q' => rights |= CASTLE_DARK_QUEENSIDE,
            _ => return Err(FenError::BadCastlingChar(ch)),
        }
    }
    Ok(rights)
}

/// Drop rights whose king or rook is not on its home square.
fn sanitize_castling(position: &Position, rights: CastlingRights) -> CastlingRights {
    let home = |sq: Square, color: Color, kind: PieceKind| position.piece_at(sq).is(color, kind);
    let mut out = rights;
    if !home(E1, Color::Light, PieceKind::King) {
        out &= !(CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE);
    }
    if !home(H1, Color::Light, PieceKind::Rook) {
        out &= !CASTLE_LIGHT_KINGSIDE;
    }
    if !home(A1, Color::Light, PieceKind::Rook) {
        out &= !CASTLE_LIGHT_QUEENSIDE;
    }
    if !home(E8, Color::Dark, PieceKind::King) {
        out &= !(CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
    }
    if !home(H8, Color::Dark, PieceKind::Rook) {
        out &= !CASTLE_DARK_KINGSIDE;
    }
    if !home(A8, Color::Dark, PieceKind::Rook) {
        out &= !CASTLE_DARK_QUEENSIDE;
    }
    out
}

fn parse_en_passant_square(
    en_passant_part: &str,
    side_to_move: Color,
) -> Result<Option<Square>, FenError> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    let square = algebraic_to_square(en_passant_part)
        .map_err(|_| FenError::BadEnPassant(en_passant_part.to_owned()))?;
    let expected_rank = match side_to_move {
        Color::Light => 5,
        Color::Dark => 2,
    };
    if rank_of(square) != expected_rank {
        return Err(FenError::BadEnPassant(en_passant_part.to_owned()));
    }
    Ok(Some(square))
}

fn validate(position: &Position) -> Result<(), FenError> {
    for color in Color::ALL {
        if position.piece_count(color, PieceKind::King) != 1 {
            return Err(FenError::IllegalPosition(format!(
                "{color:?} must have exactly one king"
            )));
        }
        if position
            .pieces(color, PieceKind::Pawn)
            .iter()
            .any(|&sq| rank_of(sq) == 0 || rank_of(sq) == 7)
        {
            return Err(FenError::IllegalPosition(format!(
                "{color:?} has a pawn on a back rank"
            )));
        }
    }

    if is_king_in_check(position, position.side_to_move.opposite()) {
        return Err(FenError::IllegalPosition(
            "side not to move is in check".to_owned(),
        ));
    }
    Ok(())
}
