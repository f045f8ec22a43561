//! Error types used throughout the engine core.
//!
//! Parsing and protocol failures are recoverable and carry enough context to
//! report back to a user. Contract violations inside the board model (for
//! example unmaking a move that was never made) are defects and panic
//! instead of surfacing here.

use thiserror::Error;

/// Failure to parse a Forsyth-Edwards Notation string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    /// A required whitespace-separated field is absent.
    #[error("missing {0} field in FEN")]
    MissingField(&'static str),

    #[error("FEN has extra trailing fields")]
    TrailingFields,

    /// The board layout does not describe exactly eight ranks of eight files.
    #[error("invalid board layout: {0}")]
    BadBoardLayout(String),

    #[error("invalid piece character '{0}' in board layout")]
    BadPieceChar(char),

    #[error("invalid side-to-move field: {0}")]
    BadSideToMove(String),

    #[error("invalid castling rights character: {0}")]
    BadCastlingChar(char),

    #[error("invalid en-passant square: {0}")]
    BadEnPassant(String),

    #[error("invalid {field} clock: {value}")]
    BadClock { field: &'static str, value: String },

    /// The position cannot arise in a legal game (missing king, too many
    /// pieces, side not to move already in check, pawns on back ranks).
    #[error("illegal position: {0}")]
    IllegalPosition(String),
}

/// Failure to turn long algebraic text into a legal move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("invalid square '{0}'")]
    BadSquare(String),

    #[error("invalid long algebraic move '{0}'")]
    BadFormat(String),

    #[error("move '{0}' is not legal in this position")]
    Illegal(String),
}

/// Errors surfaced by the UCI front-end.
#[derive(Debug, Error)]
pub enum UciError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error(transparent)]
    Move(#[from] MoveParseError),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidOption { name: String, value: String },

    #[error("malformed command: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
