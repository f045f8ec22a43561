//! Core value types shared by the board model, move generation, and search.
//!
//! Squares use a 10x12 padded mailbox: two sentinel ranks above and below the
//! playing area and one sentinel file on each side. Index 21 is a1, 98 is h8.

pub use crate::game_state::game_state::Position;
pub use crate::game_state::undo_state::UndoState;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Mailbox step a pawn of this color advances by.
    #[inline]
    pub const fn pawn_push(self) -> i8 {
        match self {
            Color::Light => 10,
            Color::Dark => -10,
        }
    }
}

/// Piece kind (color is represented separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PieceKind::Pawn),
            1 => Some(PieceKind::Knight),
            2 => Some(PieceKind::Bishop),
            3 => Some(PieceKind::Rook),
            4 => Some(PieceKind::Queen),
            5 => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Material value in centipawns. Kings carry no material.
    #[inline]
    pub const fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }

    #[inline]
    pub const fn is_slider(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    pub fn fen_char(self, color: Color) -> char {
        let base = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match color {
            Color::Light => base.to_ascii_uppercase(),
            Color::Dark => base,
        }
    }

    pub fn from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
        let color = if ch.is_ascii_uppercase() {
            Color::Light
        } else if ch.is_ascii_lowercase() {
            Color::Dark
        } else {
            return None;
        };

        let kind = match ch.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some((color, kind))
    }
}

/// Contents of one mailbox cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    OffBoard,
    Empty,
    Piece(Color, PieceKind),
}

impl Cell {
    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[inline]
    pub const fn is_off_board(self) -> bool {
        matches!(self, Cell::OffBoard)
    }

    #[inline]
    pub const fn piece(self) -> Option<(Color, PieceKind)> {
        match self {
            Cell::Piece(color, kind) => Some((color, kind)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_color(self, color: Color) -> bool {
        matches!(self, Cell::Piece(c, _) if c == color)
    }

    #[inline]
    pub fn is(self, color: Color, kind: PieceKind) -> bool {
        self == Cell::Piece(color, kind)
    }
}

/// Compact castling rights bitmask.
pub type CastlingRights = u8;
pub const CASTLE_LIGHT_KINGSIDE: CastlingRights = 1 << 0;
pub const CASTLE_LIGHT_QUEENSIDE: CastlingRights = 1 << 1;
pub const CASTLE_DARK_KINGSIDE: CastlingRights = 1 << 2;
pub const CASTLE_DARK_QUEENSIDE: CastlingRights = 1 << 3;
pub const CASTLE_ALL: CastlingRights = 0x0F;

/// Mailbox square index (`0..120`). Off-board indices hold sentinels.
pub type Square = u8;

pub const BOARD_SQUARES: usize = 120;
pub const NO_SQUARE: Square = 0;

pub const A1: Square = 21;
pub const B1: Square = 22;
pub const C1: Square = 23;
pub const D1: Square = 24;
pub const E1: Square = 25;
pub const F1: Square = 26;
pub const G1: Square = 27;
pub const H1: Square = 28;
pub const A8: Square = 91;
pub const B8: Square = 92;
pub const C8: Square = 93;
pub const D8: Square = 94;
pub const E8: Square = 95;
pub const F8: Square = 96;
pub const G8: Square = 97;
pub const H8: Square = 98;

/// Build a mailbox square from zero-based file and rank.
#[inline]
pub const fn square_from_coords(file: u8, rank: u8) -> Square {
    21 + file + rank * 10
}

/// Zero-based file of an on-board mailbox square.
#[inline]
pub const fn file_of(square: Square) -> u8 {
    square % 10 - 1
}

/// Zero-based rank of an on-board mailbox square.
#[inline]
pub const fn rank_of(square: Square) -> u8 {
    square / 10 - 2
}

/// True when `square` lies inside the 8x8 playing area.
#[inline]
pub const fn is_playable(square: Square) -> bool {
    let file = square % 10;
    square >= 21 && square <= 98 && file >= 1 && file <= 8
}

/// Apply a signed mailbox offset. Results stay inside the padded array for
/// every offset used by the move tables.
#[inline]
pub const fn offset_square(square: Square, delta: i8) -> Square {
    (square as i16 + delta as i16) as Square
}

/// Same square seen from the other side of the board.
#[inline]
pub const fn mirror_square(square: Square) -> Square {
    square_from_coords(file_of(square), 7 - rank_of(square))
}

/// Iterator over all 64 playable squares, a1 first.
pub fn playable_squares() -> impl Iterator<Item = Square> {
    (0..8u8).flat_map(|rank| (0..8u8).map(move |file| square_from_coords(file, rank)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_geometry_round_trips() {
        for sq in playable_squares() {
            assert!(is_playable(sq));
            assert_eq!(square_from_coords(file_of(sq), rank_of(sq)), sq);
            assert_eq!(mirror_square(mirror_square(sq)), sq);
        }
        assert_eq!(playable_squares().count(), 64);
        assert!(!is_playable(20));
        assert!(!is_playable(29));
        assert!(!is_playable(30));
        assert!(!is_playable(99));
        assert_eq!(mirror_square(E1), E8);
    }

    #[test]
    fn fen_chars_round_trip() {
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let ch = kind.fen_char(color);
                assert_eq!(PieceKind::from_fen_char(ch), Some((color, kind)));
            }
        }
        assert_eq!(PieceKind::from_fen_char('x'), None);
    }
}
