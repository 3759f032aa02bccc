//! Rules-engine side of the position explorer: FEN parsing, position
//! canonicalization and SAN movetext replay on top of cozy-chess.

pub mod fen;
pub mod pgn;
pub mod position;
pub mod types;

pub use fen::{format_fen, parse_fen, FenError};
pub use position::{canonicalize, PositionKey};
pub use types::Side;
