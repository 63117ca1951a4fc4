//! Opening-book moves: normalization of raw lookup results, the lookup
//! collaborator, and the cancellable fetch coordinator.

mod fetch;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use async_trait::async_trait;
use chess::{PieceColor, PositionKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fetch::{BookFetcher, FetchStatus};

/// Raw entry returned by an opening-book lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMove {
    pub san: String,
    pub white: u64,
    pub black: u64,
    pub draws: u64,
    pub average_rating: Option<u32>,
}

impl BookMove {
    pub fn total(&self) -> u64 {
        self.white + self.black + self.draws
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookQuery {
    pub fen: String,
    pub variant: String,
    pub ratings: Vec<u32>,
    pub speeds: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Book lookup failed: {0}")]
    Lookup(String),

    #[error("Book lookup cancelled")]
    Cancelled,
}

/// Asynchronous opening-book lookup.
#[async_trait]
pub trait BookSource: Send + Sync + 'static {
    async fn fetch(&self, query: BookQuery) -> Result<Vec<BookMove>, BookError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub has_data: bool,
    pub white_wins: u64,
    pub black_wins: u64,
    pub draws: u64,
    pub count: u64,
    pub average_elo: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMoveCandidate {
    pub san: String,
    pub details: BookDetails,
    pub move_count: u64,
}

/// Book candidates stored for one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookMoves {
    pub moves: Vec<BookMoveCandidate>,
}

/// A book candidate annotated with the player's own use of the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedBookMove {
    #[serde(flatten)]
    pub candidate: BookMoveCandidate,
    pub is_recommended: bool,
    pub player_count: u32,
    pub level: Option<u8>,
}

/// Reshape raw lookup entries into candidates.
///
/// With a repertoire color set, a position where the other side is to move
/// keeps no suggestions.
pub fn normalize_book_moves(
    key: &PositionKey,
    moves: &[BookMove],
    repertoire_color: Option<PieceColor>,
) -> BookMoves {
    if let Some(color) = repertoire_color {
        if key.side_to_move() != Some(color) {
            return BookMoves::default();
        }
    }
    BookMoves {
        moves: moves.iter().map(to_candidate).collect(),
    }
}

fn to_candidate(mv: &BookMove) -> BookMoveCandidate {
    let count = mv.total();
    BookMoveCandidate {
        san: mv.san.clone(),
        details: BookDetails {
            has_data: true,
            white_wins: mv.white,
            black_wins: mv.black,
            draws: mv.draws,
            count,
            average_elo: mv.average_rating,
        },
        move_count: count,
    }
}
