//! Move legality and generation, behind a trait so the opening tree never
//! depends on a particular chess library.

use serde::Serialize;

use crate::fen::{format_fen, parse_fen, FenError};
use crate::game::{Game, GameError, StartPosition};
use crate::types::PieceColor;

/// A move that was legal in the position it was played from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMove {
    pub san: String,
    pub uci: String,
    pub from: String,
    pub to: String,
    pub fen_after: String,
}

/// Authoritative chess rules.
///
/// Positions are passed as FEN strings; a two-field position key is also
/// accepted, in which case castling and en passant are unavailable.
pub trait MoveRules {
    /// Full board state of the variant's starting position.
    fn start_fen(&self) -> String;

    fn side_to_move(&self, fen: &str) -> Result<PieceColor, RulesError>;

    /// Play `san` from `fen`.
    fn play(&self, fen: &str, san: &str) -> Result<AppliedMove, RulesError>;
}

/// [`MoveRules`] backed by cozy-chess.
#[derive(Debug, Clone)]
pub struct CozyRules {
    start: StartPosition,
    start_fen: String,
}

impl CozyRules {
    pub fn new(start: StartPosition) -> Result<Self, RulesError> {
        let start_fen = start.fen().map_err(RulesError::from_game)?;
        Ok(Self { start, start_fen })
    }

    pub fn standard() -> Self {
        Self {
            start: StartPosition::Standard,
            start_fen: format_fen(&cozy_chess::Board::default()),
        }
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start
    }
}

impl MoveRules for CozyRules {
    fn start_fen(&self) -> String {
        self.start_fen.clone()
    }

    fn side_to_move(&self, fen: &str) -> Result<PieceColor, RulesError> {
        Ok(parse_fen(fen)?.side_to_move().into())
    }

    fn play(&self, fen: &str, san: &str) -> Result<AppliedMove, RulesError> {
        let mut game = Game::from_fen(fen).map_err(RulesError::from_game)?;
        let entry = game.play_san(san).map_err(|_| RulesError::IllegalMove {
            san: san.to_string(),
            fen: fen.to_string(),
        })?;

        Ok(AppliedMove {
            san: entry.san.clone(),
            uci: entry.uci.clone(),
            from: entry.from_square().to_string(),
            to: entry.to_square().to_string(),
            fen_after: entry.fen_after.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error(transparent)]
    Fen(#[from] FenError),
    #[error("Illegal move {san} in position {fen}")]
    IllegalMove { san: String, fen: String },
    #[error("Invalid start position: {0}")]
    Start(String),
}

impl RulesError {
    fn from_game(err: GameError) -> Self {
        match err {
            GameError::FenError(fen) => Self::Fen(fen),
            other => Self::Start(other.to_string()),
        }
    }
}
