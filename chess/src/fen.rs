use std::borrow::Borrow;
use std::fmt;

use cozy_chess::Board;
use serde::Serialize;

use crate::types::PieceColor;

/// Defaults for the FEN fields a position key drops: castling, en passant,
/// halfmove clock and fullmove number.
const DROPPED_FIELD_DEFAULTS: [&str; 4] = ["-", "-", "0", "1"];

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let completed = complete_fen(fen)?;
    completed
        .parse()
        .map_err(|_| FenError::InvalidBoardLayout(fen.to_string()))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// Canonical identity of a position in the opening graph: piece placement
/// plus side to move. Castling rights, en passant and move counters are
/// not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn side_to_move(&self) -> Option<PieceColor> {
        self.0
            .split(' ')
            .nth(1)
            .and_then(PieceColor::from_fen_field)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PositionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PositionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a board-state string to its position key.
///
/// Keeps the first two whitespace-separated fields. Idempotent: a key
/// normalizes to itself.
pub fn position_key(fen: &str) -> Result<PositionKey, FenError> {
    let mut parts = fen.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(placement), Some(side)) => Ok(PositionKey(format!("{} {}", placement, side))),
        _ => Err(FenError::MissingFields(fen.to_string())),
    }
}

/// Fill in the fields a position key omits so the result is a full
/// six-field FEN. Extra trailing fields are dropped.
pub fn complete_fen(fen: &str) -> Result<String, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().take(6).collect();
    if parts.len() < 2 {
        return Err(FenError::MissingFields(fen.to_string()));
    }
    let mut fields = parts;
    fields.extend(DROPPED_FIELD_DEFAULTS[fields.len() - 2..].iter().copied());
    Ok(fields.join(" "))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("FEN needs at least piece placement and side to move: {0:?}")]
    MissingFields(String),
    #[error("Invalid board layout: {0:?}")]
    InvalidBoardLayout(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_position_key_drops_counters() {
        let key = position_key(START).unwrap();
        assert_eq!(key.as_str(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w");
        assert_eq!(key.side_to_move(), Some(PieceColor::White));
    }

    #[test]
    fn test_position_key_ignores_castling_and_en_passant() {
        let a = position_key("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2").unwrap();
        let b = position_key("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w - - 4 9").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_position_key_rejects_single_field() {
        assert!(matches!(
            position_key("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(FenError::MissingFields(_))
        ));
        assert!(position_key("").is_err());
    }

    #[test]
    fn test_complete_fen_from_key() {
        let completed = complete_fen("8/8/8/8/8/8/8/K6k b").unwrap();
        assert_eq!(completed, "8/8/8/8/8/8/8/K6k b - - 0 1");
        assert_eq!(complete_fen(START).unwrap(), START);
    }

    #[test]
    fn test_parse_fen_accepts_key() {
        let board = parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w").unwrap();
        assert_eq!(board.side_to_move(), cozy_chess::Color::White);
        assert!(parse_fen("not a fen").is_err());
    }

    proptest! {
        #[test]
        fn prop_position_key_is_idempotent(
            placement in "[1-8pnbrqkPNBRQK/]{1,40}",
            side in "[wb]",
            rest in "( [-KQkqa-h1-8]{1,4}){0,4}",
        ) {
            let fen = format!("{} {}{}", placement, side, rest);
            let once = position_key(&fen).unwrap();
            let twice = position_key(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
