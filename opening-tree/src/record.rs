//! Immutable per-game records appended to the opening graph.

use chess::{GameResult, PgnGame, PieceColor};
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{FormatError, TreeResult};

/// How a game ended from the tracked player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerOutcome {
    Win,
    Loss,
    Draw,
}

/// One game as stored in the graph.
///
/// `index` is assigned by [`OpeningGraph::add_game`](crate::OpeningGraph::add_game)
/// and never changes afterwards; aggregates refer to games by this index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub index: usize,
    pub result: GameResult,
    pub white: String,
    pub black: String,
    /// `None` when the header is missing or an unknown-rating placeholder.
    pub white_elo: Option<u32>,
    pub black_elo: Option<u32>,
    pub date: Option<NaiveDate>,
    pub number_of_plys: u32,
    pub url: Option<String>,
}

impl GameRecord {
    pub fn new(
        result: GameResult,
        white_elo: u32,
        black_elo: u32,
        date: Option<NaiveDate>,
        number_of_plys: u32,
    ) -> Self {
        Self {
            index: 0,
            result,
            white: String::new(),
            black: String::new(),
            white_elo: Some(white_elo),
            black_elo: Some(black_elo),
            date,
            number_of_plys,
            url: None,
        }
    }

    /// Build a record from PGN headers and the main line length.
    pub fn from_pgn(game: &PgnGame) -> TreeResult<Self> {
        let date = match game.tag("Date").or_else(|| game.tag("UTCDate")) {
            Some(value) => parse_date(value)?,
            None => None,
        };
        let url = game
            .tag("Link")
            .or_else(|| game.tag("Site"))
            .filter(|s| s.starts_with("http"))
            .map(str::to_string);

        Ok(Self {
            index: 0,
            result: game.result,
            white: game.tag("White").unwrap_or_default().to_string(),
            black: game.tag("Black").unwrap_or_default().to_string(),
            white_elo: parse_elo("WhiteElo", game.tag("WhiteElo"))?,
            black_elo: parse_elo("BlackElo", game.tag("BlackElo"))?,
            date,
            number_of_plys: u32::try_from(game.moves.len()).unwrap_or(u32::MAX),
            url,
        })
    }

    /// Elo of whoever sat across from `color`, if they were rated.
    pub fn opponent_elo(&self, color: PieceColor) -> Option<u32> {
        match color {
            PieceColor::White => self.black_elo,
            PieceColor::Black => self.white_elo,
        }
    }

    pub fn player_name(&self, color: PieceColor) -> &str {
        match color {
            PieceColor::White => &self.white,
            PieceColor::Black => &self.black,
        }
    }

    /// Anything other than a decisive result counts as a draw, unfinished
    /// games included.
    pub fn outcome_for(&self, color: PieceColor) -> PlayerOutcome {
        match (self.result, color) {
            (GameResult::WhiteWins, PieceColor::White) | (GameResult::BlackWins, PieceColor::Black) => {
                PlayerOutcome::Win
            }
            (GameResult::WhiteWins, PieceColor::Black) | (GameResult::BlackWins, PieceColor::White) => {
                PlayerOutcome::Loss
            }
            (GameResult::Draw | GameResult::Ongoing, _) => PlayerOutcome::Draw,
        }
    }
}

/// Missing or placeholder (`?`, `-`) elo headers mean the player was unrated.
fn parse_elo(tag: &'static str, value: Option<&str>) -> TreeResult<Option<u32>> {
    match value.map(str::trim) {
        None | Some("") | Some("?") | Some("-") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| {
            FormatError::InvalidTag {
                tag,
                value: v.to_string(),
            }
            .into()
        }),
    }
}

/// `YYYY.MM.DD`; any unknown (`?`) component makes the game undated.
fn parse_date(value: &str) -> TreeResult<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() || value.contains('?') {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y.%m.%d")
        .map(Some)
        .map_err(|_| {
            FormatError::InvalidTag {
                tag: "Date",
                value: value.to_string(),
            }
            .into()
        })
}
