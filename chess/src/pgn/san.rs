use cozy_chess::{Board, GameStatus, Move, Piece, Square};

use crate::converters::{file_to_char, format_square, rank_to_char};
use crate::types::PieceKind;
use crate::uci::parse_uci_move;

/// Parse Standard Algebraic Notation (SAN) move
///
/// Check and mate markers, annotation glyphs and a missing `=` before a
/// promotion piece are tolerated. `0-0` is read as `O-O`. A UCI move such
/// as `e2e4` is accepted as a last resort.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize_san(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut found = None;
    for mv in legal_moves(board) {
        let candidate = san_body(board, mv);
        if candidate == wanted || candidate.replace('=', "") == wanted.replace('=', "") {
            if found.is_some() {
                return Err(SanError::AmbiguousMove(san.to_string()));
            }
            found = Some(mv);
        }
    }

    if let Some(mv) = found {
        return Ok(mv);
    }

    parse_uci_move(board, &wanted).ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// Format a legal move as SAN, including `+` / `#`.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = san_body(board, mv);

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won { '#' } else { '+' });
    }
    san
}

/// Strip suffixes and normalise castling so two spellings of the same move compare equal.
pub fn normalize_san(san: &str) -> String {
    let trimmed = san
        .trim()
        .trim_end_matches("e.p.")
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
    match trimmed {
        "0-0" | "o-o" => "O-O".to_string(),
        "0-0-0" | "o-o-o" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// SAN without the check suffix.
fn san_body(board: &Board, mv: Move) -> String {
    let piece = match board.piece_on(mv.from) {
        Some(p) => p,
        None => return format_square(mv.from) + &format_square(mv.to),
    };

    let mover = board.color_on(mv.from);
    if piece == Piece::King && board.color_on(mv.to) == mover {
        return if mv.to.file() as usize > mv.from.file() as usize {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let captures_piece = board.color_on(mv.to).is_some_and(|c| Some(c) != mover);
    let en_passant = piece == Piece::Pawn && mv.from.file() != mv.to.file();
    let capture = captures_piece || en_passant;

    let mut san = String::new();
    match PieceKind::from(piece).san_letter() {
        None => {
            if capture {
                san.push(file_to_char(mv.from.file()));
            }
        }
        Some(letter) => {
            san.push(letter);
            san.push_str(&disambiguation(board, mv, piece));
        }
    }

    if capture {
        san.push('x');
    }
    san.push_str(&format_square(mv.to));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(PieceKind::from(promo).to_char_upper());
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece))
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        return file_to_char(mv.from.file()).to_string();
    }
    if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        return rank_to_char(mv.from.rank()).to_string();
    }
    format_square(mv.from)
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
