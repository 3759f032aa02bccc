use cozy_chess::Board;

use super::san::{format_san, parse_san};

/// One mainline ply: the position it was played from and the move played.
#[derive(Debug, Clone)]
pub struct ReplayedPly {
    /// Zero-based ply index from the start position.
    pub ply: u32,
    pub before: Board,
    /// SAN as re-formatted from the board, so spelling differences in the
    /// source PGN (`0-0`, `e8Q`, missing `+`) are normalized away.
    pub san: String,
}

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Extract the mainline SAN tokens from PGN movetext.
///
/// Comments (`{...}` and `;` to end of line), variations `(...)`, NAGs (`$n`),
/// move numbers and the result token are dropped.
pub fn parse_movetext(input: &str) -> Result<Vec<String>, PgnError> {
    let mut stripped = String::with_capacity(input.len());
    let mut variation_depth = 0usize;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if !chars.by_ref().any(|c| c == '}') {
                    return Err(PgnError::UnterminatedComment);
                }
                stripped.push(' ');
            }
            ';' => {
                chars.by_ref().find(|c| *c == '\n');
                stripped.push(' ');
            }
            '(' => variation_depth += 1,
            ')' => {
                variation_depth = variation_depth
                    .checked_sub(1)
                    .ok_or(PgnError::UnbalancedVariation)?;
                stripped.push(' ');
            }
            _ if variation_depth > 0 => {}
            _ => stripped.push(c),
        }
    }
    if variation_depth != 0 {
        return Err(PgnError::UnbalancedVariation);
    }

    let mut sans = Vec::new();
    for token in stripped.split_whitespace() {
        if token.starts_with('$') || RESULT_TOKENS.contains(&token) {
            continue;
        }
        let san = strip_move_number(token);
        if !san.is_empty() {
            sans.push(san.to_string());
        }
    }
    Ok(sans)
}

/// `12.` / `12...` prefixes, leaving `0-0` style castling intact.
fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < token.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

/// Replay SAN moves from `start`, returning every ply with the board it was
/// played from.
pub fn replay<S: AsRef<str>>(start: &Board, sans: &[S]) -> Result<Vec<ReplayedPly>, PgnError> {
    let mut board = start.clone();
    let mut plies = Vec::with_capacity(sans.len());

    for (ply, san) in sans.iter().enumerate() {
        let san = san.as_ref();
        let mv = parse_san(&board, san).map_err(|source| PgnError::IllegalMove {
            ply: ply as u32,
            source,
        })?;
        let formatted = format_san(&board, mv).map_err(|source| PgnError::IllegalMove {
            ply: ply as u32,
            source,
        })?;

        let before = board.clone();
        board.play_unchecked(mv);
        plies.push(ReplayedPly {
            ply: ply as u32,
            before,
            san: formatted,
        });
    }

    Ok(plies)
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Unterminated comment in movetext")]
    UnterminatedComment,
    #[error("Unbalanced variation parentheses in movetext")]
    UnbalancedVariation,
    #[error("Illegal move at ply {ply}: {source}")]
    IllegalMove {
        ply: u32,
        #[source]
        source: super::san::SanError,
    },
}
