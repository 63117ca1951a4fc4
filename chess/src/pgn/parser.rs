use std::collections::HashMap;

use serde::Serialize;

use super::lexer::{tokenize, Token};
use super::PgnError;

/// A parsed PGN game
#[derive(Debug, Clone, Default)]
pub struct PgnGame {
    pub tags: HashMap<String, String>,
    pub moves: Vec<PgnMove>,
    pub result: GameResult,
}

/// A single main-line move in PGN with its annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnMove {
    pub san: String,
    pub comment: Option<String>,
    pub nags: Vec<u8>, // Numeric Annotation Glyphs (!!, ?, etc.)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    pub fn from_pgn(text: &str) -> Option<Self> {
        match text {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" | "½-½" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }

    pub fn as_pgn(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn sans(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(|m| m.san.as_str())
    }

    fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.moves.is_empty()
    }
}

/// Parse PGN text holding one or more games.
///
/// Only the main line of each game is kept; variations are skipped. A game
/// without a terminating result token takes its result from the `Result` tag.
pub fn parse_pgn(input: &str) -> Result<Vec<PgnGame>, PgnError> {
    let tokens = tokenize(input)?;

    let mut games = Vec::new();
    let mut current = PgnGame::default();
    let mut depth = 0usize;
    let mut saw_movetext = false;

    for token in tokens {
        match token {
            Token::Tag { name, value } => {
                if depth > 0 {
                    return Err(PgnError::UnbalancedVariation);
                }
                if saw_movetext {
                    finish_game(&mut current, None, &mut games);
                    saw_movetext = false;
                }
                current.tags.insert(name, value);
            }
            Token::Comment(text) if depth == 0 => {
                if let Some(last) = current.moves.last_mut() {
                    last.comment = Some(match last.comment.take() {
                        Some(existing) => format!("{} {}", existing, text),
                        None => text,
                    });
                }
            }
            Token::Nag(nag) if depth == 0 => {
                if let Some(last) = current.moves.last_mut() {
                    last.nags.push(nag);
                }
            }
            Token::San(san) if depth == 0 => {
                saw_movetext = true;
                current.moves.push(PgnMove {
                    san,
                    comment: None,
                    nags: Vec::new(),
                });
            }
            Token::OpenVariation => depth += 1,
            Token::CloseVariation => {
                depth = depth.checked_sub(1).ok_or(PgnError::UnbalancedVariation)?;
            }
            Token::Result(result) if depth == 0 => {
                finish_game(&mut current, Some(result), &mut games);
                saw_movetext = false;
            }
            Token::MoveNumber { .. }
            | Token::Comment(_)
            | Token::Nag(_)
            | Token::San(_)
            | Token::Result(_) => {}
        }
    }

    if depth != 0 {
        return Err(PgnError::UnbalancedVariation);
    }
    if !current.is_empty() {
        finish_game(&mut current, None, &mut games);
    }
    if games.is_empty() {
        return Err(PgnError::NoGames);
    }

    Ok(games)
}

fn finish_game(current: &mut PgnGame, result: Option<GameResult>, games: &mut Vec<PgnGame>) {
    let mut game = std::mem::take(current);
    game.result = result
        .or_else(|| game.tag("Result").and_then(GameResult::from_pgn))
        .unwrap_or_default();
    games.push(game);
}
