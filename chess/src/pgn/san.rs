use cozy_chess::{Board, GameStatus, Move, Piece, Square};

/// Parse a Standard Algebraic Notation (SAN) move against `board`.
///
/// Check/mate markers and annotation glyphs (`+`, `#`, `!`, `?`) are ignored,
/// `0-0` is read as `O-O`, and a promotion written without `=` (`e8Q`) is
/// accepted.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = clean_san(san)?;
    let legal = legal_moves(board);

    let mut found = None;
    for &mv in &legal {
        if san_body(board, mv, &legal) == wanted {
            if found.is_some() {
                return Err(SanError::AmbiguousMove(san.to_string()));
            }
            found = Some(mv);
        }
    }

    found.ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// Format a legal move as SAN, including the `+`/`#` suffix.
pub fn format_san(board: &Board, mv: Move) -> Result<String, SanError> {
    let legal = legal_moves(board);
    if !legal.contains(&mv) {
        return Err(SanError::NoLegalMove(format_move_simple(mv)));
    }

    let mut san = san_body(board, mv, &legal);
    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }
    Ok(san)
}

pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// SAN without the check suffix.
fn san_body(board: &Board, mv: Move, legal: &[Move]) -> String {
    let us = board.side_to_move();
    let Some(piece) = board.piece_on(mv.from) else {
        return format_move_simple(mv);
    };

    // cozy-chess encodes castling as the king capturing its own rook.
    if piece == Piece::King && board.colors(us).has(mv.to) {
        return if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let is_capture =
        board.colors(!us).has(mv.to) || (piece == Piece::Pawn && mv.from.file() != mv.to.file());
    let mut san = String::new();

    if piece == Piece::Pawn {
        if is_capture {
            san.push(file_char(mv.from));
        }
    } else {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, mv, piece, legal));
    }

    if is_capture {
        san.push('x');
    }
    san.push_str(&format_square(mv.to));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(piece_letter(promo));
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece, legal: &[Move]) -> String {
    let rivals: Vec<Square> = legal
        .iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece))
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        file_char(mv.from).to_string()
    } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        rank_char(mv.from).to_string()
    } else {
        format_square(mv.from)
    }
}

fn clean_san(san: &str) -> Result<String, SanError> {
    let trimmed = san.trim().trim_end_matches(['+', '#', '!', '?']);
    if trimmed.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut cleaned = trimmed.replace('0', "O");
    let bytes = cleaned.as_bytes();
    let n = bytes.len();
    if n >= 2 && b"QRBN".contains(&bytes[n - 1]) && bytes[n - 2].is_ascii_digit() {
        cleaned.insert(n - 1, '=');
    }
    Ok(cleaned)
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn format_move_simple(mv: Move) -> String {
    format!("{}{}", format_square(mv.from), format_square(mv.to))
}

fn format_square(sq: Square) -> String {
    format!("{}{}", file_char(sq), rank_char(sq))
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    fn san_of(fen: &str, from_to: &str) -> String {
        let board = parse_fen(fen).unwrap();
        let mv = legal_moves(&board)
            .into_iter()
            .find(|m| format_move_simple(*m) == from_to)
            .unwrap();
        format_san(&board, mv).unwrap()
    }

    #[test]
    fn formats_opening_moves() {
        let board = Board::default();
        let e4 = parse_san(&board, "e4").unwrap();
        assert_eq!(format_move_simple(e4), "e2e4");
        let nf3 = parse_san(&board, "Nf3").unwrap();
        assert_eq!(format_san(&board, nf3).unwrap(), "Nf3");
    }

    #[test]
    fn formats_castling() {
        let fen = "r3k2r/pppqbppp/2np1n2/4p3/2B1P1b1/2NP1N2/PPPBQPPP/R3K2R w KQkq - 4 8";
        assert_eq!(san_of(fen, "e1h1"), "O-O");
        assert_eq!(san_of(fen, "e1a1"), "O-O-O");

        let board = parse_fen(fen).unwrap();
        assert_eq!(parse_san(&board, "0-0").unwrap(), parse_san(&board, "O-O").unwrap());
    }

    #[test]
    fn disambiguates_by_file_then_rank() {
        // Knights on b1 and f3 can both reach d2.
        let fen = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
        assert_eq!(san_of(fen, "b1d2"), "Nbd2");
        // Rooks on a1 and a5 can both reach a3.
        let fen = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a3"), "R1a3");
    }

    #[test]
    fn formats_pawn_captures_and_en_passant() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        assert_eq!(san_of(fen, "e4d5"), "exd5");

        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert_eq!(san_of(fen, "e5f6"), "exf6");
    }

    #[test]
    fn formats_promotion_check_and_mate() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        let board = parse_fen(fen).unwrap();
        let mv = parse_san(&board, "e8Q").unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
        assert_eq!(format_san(&board, mv).unwrap(), "e8=Q");

        // Fool's mate.
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san_of(fen, "d8h4"), "Qh4#");

        let fen = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a8"), "Ra8+");
    }

    #[test]
    fn rejects_unknown_moves() {
        let board = Board::default();
        assert!(matches!(parse_san(&board, "e5"), Err(SanError::NoLegalMove(_))));
        assert!(matches!(parse_san(&board, "+"), Err(SanError::InvalidFormat(_))));
    }
}
