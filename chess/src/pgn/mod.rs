//! PGN movetext handling: SAN parsing/formatting and mainline replay.

pub mod parser;
pub mod san;

pub use parser::{parse_movetext, replay, PgnError, ReplayedPly};
pub use san::{format_san, legal_moves, parse_san, SanError};
