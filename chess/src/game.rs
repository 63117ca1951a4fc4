use cozy_chess::{Board, Color, Move};

use crate::pgn::san::{format_san, parse_san};
use crate::uci::{convert_cozy_castling_to_uci, format_uci_move};

/// Replays a sequence of moves from a start position, recording the board
/// state before and after each one.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    start_position: StartPosition,
}

/// One replayed half-move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub san: String,      // canonical Standard Algebraic Notation
    pub uci: String,      // king-destination castling, e.g. e1g1
    pub fen_before: String,
    pub fen_after: String,
}

impl HistoryEntry {
    /// Origin square in UCI form.
    pub fn from_square(&self) -> &str {
        self.uci.get(0..2).unwrap_or_default()
    }

    /// Destination square in UCI form.
    pub fn to_square(&self) -> &str {
        self.uci.get(2..4).unwrap_or_default()
    }
}

/// Starting position of the game
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StartPosition {
    #[default]
    Standard,
    Fen(String),
}

impl StartPosition {
    pub fn board(&self) -> Result<Board, GameError> {
        match self {
            Self::Standard => Ok(Board::default()),
            Self::Fen(fen) => Ok(crate::fen::parse_fen(fen)?),
        }
    }

    pub fn fen(&self) -> Result<String, GameError> {
        Ok(crate::fen::format_fen(&self.board()?))
    }
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string or position key
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Self::from_start(StartPosition::Fen(fen.to_string()))
    }

    pub fn from_start(start_position: StartPosition) -> Result<Self, GameError> {
        Ok(Self {
            position: start_position.board()?,
            history: Vec::new(),
            start_position,
        })
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Play a move written in SAN (or UCI as a fallback).
    pub fn play_san(&mut self, san: &str) -> Result<&HistoryEntry, GameError> {
        let mv = parse_san(&self.position, san).map_err(|_| GameError::IllegalMove(san.to_string()))?;
        self.make_move(mv)
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<&HistoryEntry, GameError> {
        if !self.position.is_legal(mv) {
            return Err(GameError::IllegalMove(format_uci_move(mv)));
        }

        let fen_before = self.to_fen();
        let san = format_san(&self.position, mv);
        let uci = format_uci_move(convert_cozy_castling_to_uci(&self.position, mv));

        self.position.play_unchecked(mv);

        self.history.push(HistoryEntry {
            mv,
            san,
            uci,
            fen_before,
            fen_after: self.to_fen(),
        });

        Ok(&self.history[self.history.len() - 1])
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}
