//! Error types for the opening tree

use chess::{FenError, PgnError, PieceColor, RulesError};
use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Illegal move {san} in position {fen}")]
    IllegalMove { san: String, fen: String },

    #[error("Repertoire contains no playable lines")]
    EmptyRepertoire,

    #[error("Graph already tracks {tracked} games, cannot add a game for {offered}")]
    ColorMismatch {
        tracked: PieceColor,
        offered: PieceColor,
    },

    #[error("Unbalanced variation parentheses")]
    UnbalancedVariation,
}

/// Malformed input: position strings, PGN text or game headers.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error(transparent)]
    Pgn(#[from] PgnError),

    #[error("Invalid {tag} value {value:?}")]
    InvalidTag { tag: &'static str, value: String },

    #[error("Invalid start position: {0}")]
    StartPosition(String),
}

impl From<FenError> for TreeError {
    fn from(err: FenError) -> Self {
        Self::Format(FormatError::Fen(err))
    }
}

impl From<PgnError> for TreeError {
    fn from(err: PgnError) -> Self {
        match err {
            PgnError::UnbalancedVariation => Self::UnbalancedVariation,
            other => Self::Format(FormatError::Pgn(other)),
        }
    }
}

impl From<RulesError> for TreeError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::Fen(fen) => fen.into(),
            RulesError::IllegalMove { san, fen } => Self::IllegalMove { san, fen },
            RulesError::Start(reason) => Self::Format(FormatError::StartPosition(reason)),
        }
    }
}

impl TreeError {
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, Self::IllegalMove { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_errors_map_to_taxonomy() {
        let illegal: TreeError = RulesError::IllegalMove {
            san: "Qh5".into(),
            fen: "x w".into(),
        }
        .into();
        assert!(illegal.is_illegal_move());

        let format: TreeError = RulesError::Fen(FenError::MissingFields("x".into())).into();
        assert!(matches!(format, TreeError::Format(FormatError::Fen(_))));
    }

    #[test]
    fn test_unbalanced_pgn_keeps_its_own_variant() {
        let err: TreeError = PgnError::UnbalancedVariation.into();
        assert!(matches!(err, TreeError::UnbalancedVariation));
        let err: TreeError = PgnError::NoGames.into();
        assert!(matches!(err, TreeError::Format(FormatError::Pgn(PgnError::NoGames))));
    }
}
