//! Zobrist hashing support for fast position identity and repetition tracking.
//!
//! The keys are generated from a fixed seed so hashes are deterministic across
//! runs, which is useful for testing and debugging. The tables are immutable
//! once built.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::game_state::chess_types::*;

const ZOBRIST_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; BOARD_SQUARES]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    // Off-board entries stay zero; they are never hashed.
    let mut piece_square = [[[0u64; BOARD_SQUARES]; 6]; 2];
    for color in &mut piece_square {
        for piece in color.iter_mut() {
            for sq in playable_squares() {
                piece[sq as usize] = rng.next_u64();
            }
        }
    }

    let side_to_move = rng.next_u64();

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = rng.next_u64();
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = rng.next_u64();
    }

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

/// Return the Zobrist key for a `(color, piece, square)` occupancy term.
#[inline]
pub fn piece_square_key(color: Color, piece: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][piece.index()][square as usize]
}

/// Return the Zobrist key contribution for castling rights mask (`0..=15`).
#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & CASTLE_ALL) as usize]
}

/// Return the Zobrist key contribution for an en-passant target square.
#[inline]
pub fn en_passant_key(square: Square) -> u64 {
    tables().en_passant_file[file_of(square) as usize]
}

/// Return the side-to-move toggle key (xor in when dark to move).
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Compute the full position Zobrist key from scratch.
pub fn compute_zobrist_key(position: &Position) -> u64 {
    let mut key = 0u64;

    for sq in playable_squares() {
        if let Some((color, piece)) = position.piece_at(sq).piece() {
            key ^= piece_square_key(color, piece, sq);
        }
    }

    if position.side_to_move == Color::Dark {
        key ^= side_to_move_key();
    }

    key ^= castling_key(position.castling_rights);

    if let Some(ep_square) = position.en_passant_square {
        key ^= en_passant_key(ep_square);
    }

    key
}
