//! Position canonicalization.
//!
//! A [`PositionKey`] is the lookup key shared by the statistics store and the
//! follow index. Two FENs that describe the same position for move generation
//! purposes produce the same key:
//!
//! - placement, side to move and castling rights are re-serialized by cozy-chess,
//! - the en passant square is kept only when an en passant capture is legal,
//! - the halfmove clock is reset to `0` and the fullmove number to `1`.
//!
//! The hash is the Zobrist hash of the board re-parsed from the normalized FEN,
//! so it always agrees with `normalized_fen`.

use cozy_chess::{Board, Piece, Rank, Square};
use serde::{Deserialize, Serialize};

use crate::fen::{format_fen, parse_fen, FenError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionKey {
    pub normalized_fen: String,
    pub hash: u64,
}

impl PositionKey {
    /// Canonicalize an already parsed board.
    pub fn from_board(board: &Board) -> Result<Self, FenError> {
        let normalized_fen = normalize_board(board);
        let canonical = parse_fen(&normalized_fen)?;
        Ok(Self {
            hash: canonical.hash(),
            normalized_fen,
        })
    }

    /// Hash rendered as fixed-width hex, the form used in logs and CLI output.
    pub fn hash_hex(&self) -> String {
        format!("{:016x}", self.hash)
    }
}

/// Canonicalize a FEN string into its [`PositionKey`].
pub fn canonicalize(fen: &str) -> Result<PositionKey, FenError> {
    let board = parse_fen(fen)?;
    PositionKey::from_board(&board)
}

fn normalize_board(board: &Board) -> String {
    let fen = format_fen(board);
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let ep = legal_en_passant_target(board)
        .map(|sq| sq.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!("{} {} {} {} 0 1", fields[0], fields[1], fields[2], ep)
}

/// The en passant target square, if some pawn can legally capture onto it.
fn legal_en_passant_target(board: &Board) -> Option<Square> {
    let file = board.en_passant()?;
    let target = Square::new(file, Rank::Sixth.relative_to(board.side_to_move()));

    let mut capturable = false;
    board.generate_moves(|mvs| {
        if mvs.piece == Piece::Pawn && mvs.to.has(target) {
            capturable = true;
        }
        capturable
    });

    capturable.then_some(target)
}
