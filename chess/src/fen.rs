use cozy_chess::Board;

/// Parse a FEN string into a Board.
///
/// Four-field FENs (placement, side, castling, en passant) are accepted and
/// completed with `0 1` move counters. Positions that cozy-chess rejects as
/// invalid (wrong king count, side not to move in check, ...) fail here too.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    let full = match parts.len() {
        0 => return Err(FenError::Empty),
        n if n < 4 => return Err(FenError::TooFewFields(n)),
        4 => format!("{} 0 1", parts.join(" ")),
        5 => format!("{} 1", parts.join(" ")),
        _ => parts.join(" "),
    };

    full.parse()
        .map_err(|e| FenError::Rejected(format!("{fen}: {e:?}")))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("empty FEN")]
    Empty,
    #[error("FEN has {0} fields, at least 4 are required")]
    TooFewFields(usize),
    #[error("invalid position {0}")]
    Rejected(String),
}
