//! Repertoire lines held as a prefix tree, with a position index of the
//! moves the repertoire side intends to play.

mod trie;

use std::collections::HashMap;

use chess::{complete_fen, position_key, MoveRules, PieceColor, PositionKey};
use serde::Serialize;

use crate::error::{TreeError, TreeResult};
use crate::flatten::{flatten_pgn, Variation};

pub use trie::TrieNode;

/// Where a played sequence first leaves the repertoire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    /// 1-based ply index of the deviating move.
    pub at_move: usize,
    pub played_move: String,
    pub color: PieceColor,
    /// Repertoire continuation from the deviation point.
    pub repertoire_line: Vec<String>,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepertoireComparison {
    /// Repertoire-side moves that followed the repertoire.
    pub matches: Vec<String>,
    pub deviation: Option<Deviation>,
}

#[derive(Debug, Clone)]
pub struct Repertoire {
    color: PieceColor,
    first_mover: PieceColor,
    root: TrieNode,
    recommendations: HashMap<PositionKey, String>,
}

impl Repertoire {
    /// Build a repertoire from PGN text, variations included.
    pub fn load<R: MoveRules + ?Sized>(text: &str, color: PieceColor, rules: &R) -> TreeResult<Self> {
        let variations = flatten_pgn(text)?;
        Self::from_variations(&variations, color, rules)
    }

    /// Replay every line through `rules`, keeping the legal prefix of each.
    ///
    /// Lines whose game has a `FEN` header are replayed from it; they feed
    /// the position index but not the tree, which starts at the variant's
    /// start position. Lines that begin mid-game without a `FEN` header are
    /// skipped. Fails with [`TreeError::EmptyRepertoire`] when no line has a
    /// single playable move.
    pub fn from_variations<R: MoveRules + ?Sized>(
        variations: &[Variation],
        color: PieceColor,
        rules: &R,
    ) -> TreeResult<Self> {
        let start = rules.start_fen();
        let start_key = position_key(&start)?;
        let first_mover = rules.side_to_move(&start)?;
        let start_move_number = start
            .split_whitespace()
            .nth(5)
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(1);
        let mut root = TrieNode::default();
        let mut recommendations = HashMap::new();
        let mut lines = 0usize;

        for variation in variations {
            let mut fen = match variation.start_fen() {
                Some(fen) => complete_fen(fen)?,
                None if variation.first_mover() != first_mover
                    || variation.first_move_number() != start_move_number =>
                {
                    tracing::warn!(
                        line = %variation,
                        "Skipping repertoire line that starts mid-game without a FEN header"
                    );
                    continue;
                }
                None => start.clone(),
            };
            let from_start = position_key(&fen)? == start_key;
            let mut canonical = Vec::with_capacity(variation.len());
            for san in variation.moves() {
                let applied = match rules.play(&fen, san) {
                    Ok(applied) => applied,
                    Err(err) => {
                        tracing::warn!(line = %variation, %san, error = %err, "Stopping repertoire line at unplayable move");
                        break;
                    }
                };
                let key = position_key(&fen)?;
                if key.side_to_move() == Some(color) {
                    recommendations.insert(key, applied.san.clone());
                }
                canonical.push(applied.san);
                fen = applied.fen_after;
            }
            if canonical.is_empty() {
                continue;
            }
            if from_start {
                root.insert(&canonical);
            } else {
                tracing::debug!(line = %variation, "Repertoire line from a custom position indexed only");
            }
            lines += 1;
        }

        if lines == 0 {
            return Err(TreeError::EmptyRepertoire);
        }

        tracing::info!(
            %color,
            lines,
            positions = recommendations.len(),
            "Repertoire loaded"
        );

        Ok(Self {
            color,
            first_mover,
            root,
            recommendations,
        })
    }

    pub fn color(&self) -> PieceColor {
        self.color
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    pub fn line_count(&self) -> usize {
        self.root.line_count()
    }

    /// Repertoire move for a position where the repertoire side is to move.
    pub fn recommended_move(&self, fen: &str) -> TreeResult<Option<&str>> {
        Ok(self.recommended_for_key(&position_key(fen)?))
    }

    pub fn recommended_for_key(&self, key: &PositionKey) -> Option<&str> {
        self.recommendations.get(key).map(String::as_str)
    }

    /// Follow `played` through the tree, looking at no more than
    /// `max_moves` plies. Stops at the first deviation or when the
    /// repertoire runs out.
    pub fn compare<S: AsRef<str>>(&self, played: &[S], max_moves: usize) -> RepertoireComparison {
        let mut comparison = RepertoireComparison::default();
        let mut node = &self.root;
        let mut side = self.first_mover;

        for (i, san) in played.iter().take(max_moves).enumerate() {
            if node.is_leaf() {
                break;
            }
            let san = san.as_ref();
            match node.child(san) {
                Some((key, child)) => {
                    if side == self.color {
                        comparison.matches.push(key.to_string());
                    }
                    node = child;
                }
                None => {
                    comparison.deviation = Some(Deviation {
                        at_move: i + 1,
                        played_move: san.to_string(),
                        color: side,
                        repertoire_line: node.main_line().to_vec(),
                        alternatives: node.moves().map(str::to_string).collect(),
                    });
                    break;
                }
            }
            side = side.opposite();
        }

        comparison
    }
}
