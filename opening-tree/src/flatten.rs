//! Expand PGN move text with nested variations into independent lines.

use std::fmt;

use chess::pgn::{tokenize, Token};
use chess::PieceColor;
use indexmap::IndexSet;

use crate::error::{TreeError, TreeResult};

/// A line of SAN moves from the start of its game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variation {
    moves: Vec<String>,
    first_move_number: u32,
    first_mover: PieceColor,
    start_fen: Option<String>,
}

impl Variation {
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn first_mover(&self) -> PieceColor {
        self.first_mover
    }

    pub fn first_move_number(&self) -> u32 {
        self.first_move_number
    }

    /// Value of the game's `FEN` header, if it had one.
    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Renders as numbered move text, e.g. `1. e4 e5 2. Nf3`.
impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut number = self.first_move_number;
        let mut side = self.first_mover;
        for (i, san) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match side {
                PieceColor::White => write!(f, "{number}. {san}")?,
                PieceColor::Black => {
                    if i == 0 {
                        write!(f, "{number}... {san}")?;
                    } else {
                        f.write_str(san)?;
                    }
                    number += 1;
                }
            }
            side = side.opposite();
        }
        Ok(())
    }
}

/// Saved parent line, restored when a variation closes.
#[derive(Debug, Clone)]
struct Snapshot {
    moves: Vec<String>,
    side_to_move: PieceColor,
}

/// Walk state for one game.
struct LineWalker {
    moves: Vec<String>,
    side_to_move: PieceColor,
    first_move_number: u32,
    first_mover: PieceColor,
    start_fen: Option<String>,
    stack: Vec<Snapshot>,
}

impl LineWalker {
    fn new() -> Self {
        Self {
            moves: Vec::new(),
            side_to_move: PieceColor::White,
            first_move_number: 1,
            first_mover: PieceColor::White,
            start_fen: None,
            stack: Vec::new(),
        }
    }

    fn is_fresh(&self) -> bool {
        self.moves.is_empty() && self.stack.is_empty()
    }

    fn line(&self) -> Variation {
        Variation {
            moves: self.moves.clone(),
            first_move_number: self.first_move_number,
            first_mover: self.first_mover,
            start_fen: self.start_fen.clone(),
        }
    }

    fn play(&mut self, san: String) {
        self.moves.push(san);
        self.side_to_move = self.side_to_move.opposite();
    }

    /// Save the current line and step back over the move being replaced.
    fn open(&mut self) {
        self.stack.push(Snapshot {
            moves: self.moves.clone(),
            side_to_move: self.side_to_move,
        });
        if self.moves.pop().is_some() {
            self.side_to_move = self.side_to_move.opposite();
        }
    }

    /// Finish the current variation and resume its parent.
    fn close(&mut self) -> TreeResult<Variation> {
        let parent = self.stack.pop().ok_or(TreeError::UnbalancedVariation)?;
        let finished = self.line();
        self.moves = parent.moves;
        self.side_to_move = parent.side_to_move;
        Ok(finished)
    }
}

/// Flatten PGN text into one [`Variation`] per line.
///
/// For each game the main line comes first, followed by its variations in
/// the order they close. Comments, NAGs, headers and results are dropped;
/// identical lines are reported once. A result outside any variation, or a
/// header after move text, starts a new game.
pub fn flatten_pgn(text: &str) -> TreeResult<Vec<Variation>> {
    let tokens = tokenize(text)?;
    let mut lines: IndexSet<Variation> = IndexSet::new();
    let mut game_lines: Vec<Variation> = Vec::new();
    let mut walker = LineWalker::new();

    for token in tokens {
        match token {
            Token::San(san) => walker.play(san),
            Token::MoveNumber { number, black } if walker.is_fresh() => {
                walker.first_move_number = number;
                walker.first_mover = if black {
                    PieceColor::Black
                } else {
                    PieceColor::White
                };
                walker.side_to_move = walker.first_mover;
            }
            Token::OpenVariation => walker.open(),
            Token::CloseVariation => game_lines.push(walker.close()?),
            Token::Result(_) if walker.stack.is_empty() => {
                finish_game(&mut walker, &mut game_lines, &mut lines);
            }
            Token::Tag { name, value } => {
                if !walker.stack.is_empty() {
                    return Err(TreeError::UnbalancedVariation);
                }
                if !walker.is_fresh() {
                    finish_game(&mut walker, &mut game_lines, &mut lines);
                }
                if name == "FEN" {
                    walker.start_fen = Some(value);
                }
            }
            Token::Comment(_)
            | Token::Nag(_)
            | Token::MoveNumber { .. }
            | Token::Result(_) => {}
        }
    }

    if !walker.stack.is_empty() {
        return Err(TreeError::UnbalancedVariation);
    }
    finish_game(&mut walker, &mut game_lines, &mut lines);

    Ok(lines.into_iter().collect())
}

fn finish_game(
    walker: &mut LineWalker,
    game_lines: &mut Vec<Variation>,
    lines: &mut IndexSet<Variation>,
) {
    let main = walker.line();
    if !main.is_empty() {
        lines.insert(main);
    }
    lines.extend(game_lines.drain(..).filter(|v| !v.is_empty()));
    *walker = LineWalker::new();
}
