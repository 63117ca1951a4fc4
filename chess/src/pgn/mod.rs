pub mod lexer;
pub mod parser;
pub mod san;

pub use lexer::{tokenize, Token};
pub use parser::{parse_pgn, GameResult, PgnGame, PgnMove};
pub use san::{format_san, normalize_san, parse_san, SanError};

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("PGN contains no games")]
    NoGames,
    #[error("Invalid tag: {0}")]
    InvalidTag(String),
    #[error("Unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),
    #[error("Unterminated comment starting at byte {0}")]
    UnterminatedComment(usize),
    #[error("Unexpected character {0:?} at byte {1}")]
    UnexpectedCharacter(char, usize),
    #[error("Invalid NAG: {0}")]
    InvalidNag(String),
    #[error("Invalid move number: {0}")]
    InvalidMoveNumber(String),
    #[error("Unbalanced variation parentheses")]
    UnbalancedVariation,
    #[error("SAN parse error: {0}")]
    SanError(#[from] SanError),
}
