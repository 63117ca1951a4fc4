//! Position graph built from a player's games.
//!
//! Nodes are keyed by [`PositionKey`], so transpositions share statistics.
//! Every node counts the moves played from it and lazily aggregates the
//! results of the games that passed through it.

mod details;
mod moves;
mod slot;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chess::{position_key, MoveRules, PieceColor, PositionKey};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::book::{normalize_book_moves, BookMove, BookMoves};
use crate::error::{TreeError, TreeResult};
use crate::record::GameRecord;

pub use details::{DetailsView, ExtremalGame};
pub use moves::{level_for, MoveCandidate};
pub use slot::{AggregateDetails, StatsSlot};

/// One half-move of a replayed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTransition {
    pub source_fen: String,
    pub target_fen: String,
    pub san: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub count: u32,
    pub target: PositionKey,
}

#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    played: IndexMap<String, PlayedMove>,
    played_move_max: u32,
    game_results: Vec<usize>,
    stats: StatsSlot,
}

impl GraphNode {
    /// Moves in the order they were first played from this position.
    pub fn played_moves(&self) -> impl Iterator<Item = (&str, &PlayedMove)> {
        self.played.iter().map(|(san, played)| (san.as_str(), played))
    }

    pub fn played_move_max(&self) -> u32 {
        self.played_move_max
    }

    pub fn game_result_indices(&self) -> &[usize] {
        &self.game_results
    }

    pub fn stats(&self) -> &StatsSlot {
        &self.stats
    }
}

#[derive(Debug, Clone)]
pub struct OpeningGraph {
    nodes: HashMap<PositionKey, GraphNode>,
    games: Vec<GameRecord>,
    player_color: Option<PieceColor>,
    root: PositionKey,
    book: HashMap<PositionKey, BookMoves>,
}

impl OpeningGraph {
    /// Create an empty graph rooted at the variant's starting position.
    pub fn new(root_fen: &str) -> TreeResult<Self> {
        Ok(Self {
            nodes: HashMap::new(),
            games: Vec::new(),
            player_color: None,
            root: position_key(root_fen)?,
            book: HashMap::new(),
        })
    }

    pub fn root(&self) -> &PositionKey {
        &self.root
    }

    /// Color of the player whose games this graph holds, once one is added.
    pub fn player_color(&self) -> Option<PieceColor> {
        self.player_color
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn position_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, fen: &str) -> TreeResult<Option<&GraphNode>> {
        Ok(self.nodes.get(&position_key(fen)?))
    }

    /// Fails when the graph already tracks the other color.
    pub fn check_color(&self, color: PieceColor) -> TreeResult<()> {
        match self.player_color {
            Some(tracked) if tracked != color => Err(TreeError::ColorMismatch {
                tracked,
                offered: color,
            }),
            _ => Ok(()),
        }
    }

    /// Append a game and fold it into every position it passed through.
    ///
    /// All position strings are normalized before anything is modified, so a
    /// malformed transition leaves the graph untouched. Returns the index
    /// assigned to the record.
    pub fn add_game(
        &mut self,
        mut record: GameRecord,
        transitions: &[MoveTransition],
        final_fen: &str,
        color: PieceColor,
    ) -> TreeResult<usize> {
        self.check_color(color)?;
        let keyed = transitions
            .iter()
            .map(|t| {
                Ok((
                    position_key(&t.source_fen)?,
                    position_key(&t.target_fen)?,
                    t.san.as_str(),
                ))
            })
            .collect::<TreeResult<Vec<_>>>()?;
        let final_key = position_key(final_fen)?;

        let index = self.games.len();
        record.index = index;
        self.games.push(record);
        self.player_color = Some(color);

        let Self {
            nodes, games, root, ..
        } = self;
        let games: &[GameRecord] = games;
        let record = &games[index];

        for (source, target, san) in keyed {
            let node = nodes.entry(source).or_default();
            let played = node
                .played
                .entry(san.to_string())
                .or_insert_with(|| PlayedMove {
                    count: 0,
                    target: target.clone(),
                });
            played.count += 1;
            let count = played.count;
            node.played_move_max = node.played_move_max.max(count);

            let target_node = nodes.entry(target).or_default();
            target_node.stats = std::mem::take(&mut target_node.stats).fold(record, games, color);
        }

        nodes.entry(final_key).or_default().game_results.push(index);

        let root_node = nodes.entry(root.clone()).or_default();
        root_node.stats = std::mem::take(&mut root_node.stats).fold(record, games, color);

        debug!(game_index = index, plys = transitions.len(), "added game to graph");
        Ok(index)
    }

    /// Statistics for a position. Positions no game reached yield
    /// [`DetailsView::empty`].
    pub fn details_for(&self, fen: &str) -> TreeResult<DetailsView<'_>> {
        let key = position_key(fen)?;
        Ok(self.details_for_key(&key))
    }

    fn details_for_key(&self, key: &PositionKey) -> DetailsView<'_> {
        let (Some(node), Some(color)) = (self.nodes.get(key), self.player_color) else {
            return DetailsView::empty();
        };
        match node.stats.materialize(&self.games, color) {
            Some(aggregate) => DetailsView::from_aggregate(&aggregate, &self.games, color),
            None => DetailsView::empty(),
        }
    }

    /// Store the aggregate for a lazily tracked position so later reads do
    /// not rebuild it. Returns whether the slot changed.
    pub fn commit_details(&mut self, fen: &str) -> TreeResult<bool> {
        let key = position_key(fen)?;
        let Some(color) = self.player_color else {
            return Ok(false);
        };
        let Some(node) = self.nodes.get_mut(&key) else {
            return Ok(false);
        };
        if !node.stats.is_single() {
            return Ok(false);
        }
        match node.stats.materialize(&self.games, color) {
            Some(aggregate) => {
                node.stats = StatsSlot::Aggregate(aggregate);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Candidate moves from a position.
    ///
    /// `repertoire_lookup` supplies the recommended move for the position; it
    /// is only consulted when `tracked_color` (if any) is to move. A
    /// recommended move nobody played is appended with a zero count, provided
    /// `rules` can play it.
    pub fn moves_for<R, F>(
        &self,
        fen: &str,
        tracked_color: Option<PieceColor>,
        repertoire_lookup: F,
        rules: &R,
    ) -> TreeResult<Vec<MoveCandidate<'_>>>
    where
        R: MoveRules + ?Sized,
        F: Fn(&PositionKey) -> Option<String>,
    {
        let key = position_key(fen)?;
        let recommended = match tracked_color {
            Some(color) if key.side_to_move() != Some(color) => None,
            _ => repertoire_lookup(&key),
        };

        let mut candidates = Vec::new();
        if let Some(node) = self.nodes.get(&key) {
            for (san, played) in node.played.iter().filter(|(_, p)| p.count > 0) {
                let resolved = rules
                    .play(fen, san)
                    .inspect_err(|err| debug!(%san, error = %err, "could not resolve move squares"))
                    .ok();
                candidates.push(MoveCandidate {
                    san: san.clone(),
                    uci: resolved.as_ref().map(|m| m.uci.clone()),
                    from: resolved.as_ref().map(|m| m.from.clone()),
                    to: resolved.map(|m| m.to),
                    details: self.details_for_key(&played.target),
                    move_count: played.count,
                    level: level_for(played.count, node.played_move_max),
                    is_recommended: recommended.as_deref() == Some(san.as_str()),
                });
            }
        }

        if let Some(recommended) = recommended {
            if !candidates.iter().any(|c| c.is_recommended) {
                match rules.play(fen, &recommended) {
                    Ok(applied) => candidates.push(MoveCandidate {
                        san: applied.san,
                        uci: Some(applied.uci),
                        from: Some(applied.from),
                        to: Some(applied.to),
                        details: DetailsView::empty(),
                        move_count: 0,
                        level: 3,
                        is_recommended: true,
                    }),
                    Err(err) => {
                        warn!(position = %key, san = %recommended, error = %err, "dropping unplayable repertoire move");
                    }
                }
            }
        }

        Ok(candidates)
    }

    /// Games that ended in this position, in the order they were added.
    pub fn game_results_for(&self, fen: &str) -> TreeResult<Vec<&GameRecord>> {
        let key = position_key(fen)?;
        Ok(self
            .nodes
            .get(&key)
            .map(|node| {
                node.game_results
                    .iter()
                    .filter_map(|&i| self.games.get(i))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Replace the stored opening-book moves for a position.
    pub fn merge_book_result(
        &mut self,
        fen: &str,
        moves: &[BookMove],
        repertoire_color: Option<PieceColor>,
    ) -> TreeResult<&BookMoves> {
        let key = position_key(fen)?;
        let normalized = normalize_book_moves(&key, moves, repertoire_color);
        debug!(position = %key, moves = normalized.moves.len(), "merged book result");
        let stored = match self.book.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(normalized);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(normalized),
        };
        Ok(stored)
    }

    pub fn book_moves(&self, fen: &str) -> TreeResult<Option<&BookMoves>> {
        Ok(self.book.get(&position_key(fen)?))
    }

    pub fn clear_book(&mut self) {
        self.book.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{CozyRules, GameResult};
    use chrono::NaiveDate;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn replay(rules: &CozyRules, sans: &[&str]) -> (Vec<MoveTransition>, String) {
        let mut fen = rules.start_fen();
        let mut transitions = Vec::new();
        for san in sans {
            let applied = rules.play(&fen, san).unwrap();
            transitions.push(MoveTransition {
                source_fen: fen.clone(),
                target_fen: applied.fen_after.clone(),
                san: applied.san,
            });
            fen = applied.fen_after;
        }
        (transitions, fen)
    }

    fn add(graph: &mut OpeningGraph, sans: &[&str], result: GameResult, opponent: u32) -> usize {
        let rules = CozyRules::standard();
        let (transitions, last) = replay(&rules, sans);
        let record = GameRecord::new(result, 1500, opponent, None, sans.len() as u32);
        graph
            .add_game(record, &transitions, &last, PieceColor::White)
            .unwrap()
    }

    fn fen_after(sans: &[&str]) -> String {
        replay(&CozyRules::standard(), sans).1
    }

    #[test]
    fn test_add_game_counts_moves() {
        let mut graph = OpeningGraph::new(START).unwrap();
        add(&mut graph, &["e4", "e5", "Nf3"], GameResult::WhiteWins, 1600);
        add(&mut graph, &["e4", "c5"], GameResult::BlackWins, 1700);
        add(&mut graph, &["d4"], GameResult::Draw, 1650);

        let root = graph.node(START).unwrap().unwrap();
        let played: Vec<_> = root.played_moves().map(|(san, p)| (san, p.count)).collect();
        assert_eq!(played, vec![("e4", 2), ("d4", 1)]);
        assert_eq!(root.played_move_max(), 2);

        let root_details = graph.details_for(START).unwrap();
        assert_eq!(root_details.count, 3);
        assert_eq!(root_details.player_wins, 1);

        let after_e4 = graph.details_for(&fen_after(&["e4"])).unwrap();
        assert_eq!(after_e4.count, 2);
        assert_eq!(after_e4.white_wins, 1);
        assert_eq!(after_e4.black_wins, 1);
    }

    #[test]
    fn test_transpositions_share_a_node() {
        let mut graph = OpeningGraph::new(START).unwrap();
        add(&mut graph, &["Nf3", "Nf6", "g3"], GameResult::Draw, 1500);
        add(&mut graph, &["g3", "Nf6", "Nf3"], GameResult::Draw, 1500);
        let details = graph.details_for(&fen_after(&["Nf3", "Nf6", "g3"])).unwrap();
        assert_eq!(details.count, 2);
    }

    #[test]
    fn test_single_game_slot_is_lazy_until_committed() {
        let mut graph = OpeningGraph::new(START).unwrap();
        add(&mut graph, &["e4", "e5"], GameResult::WhiteWins, 1600);
        let fen = fen_after(&["e4", "e5"]);

        let node = graph.node(&fen).unwrap().unwrap();
        assert_eq!(node.stats(), &StatsSlot::Single(0));

        let before = graph.details_for(&fen).unwrap().count;
        assert_eq!(before, 1);
        assert!(graph.node(&fen).unwrap().unwrap().stats().is_single());

        assert!(graph.commit_details(&fen).unwrap());
        assert!(matches!(
            graph.node(&fen).unwrap().unwrap().stats(),
            StatsSlot::Aggregate(_)
        ));
        assert_eq!(graph.details_for(&fen).unwrap().count, 1);
        assert!(!graph.commit_details(&fen).unwrap());
    }

    #[test]
    fn test_unknown_position_has_empty_details() {
        let graph = OpeningGraph::new(START).unwrap();
        let details = graph.details_for("8/8/8/8/8/8/8/K6k w").unwrap();
        assert_eq!(details, DetailsView::empty());
        assert!(graph.game_results_for(START).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_key_is_format_error() {
        let graph = OpeningGraph::new(START).unwrap();
        assert!(matches!(
            graph.details_for("rnbqkbnr/pppppppp"),
            Err(TreeError::Format(_))
        ));
    }

    #[test]
    fn test_color_mismatch_rejected() {
        let mut graph = OpeningGraph::new(START).unwrap();
        add(&mut graph, &["e4"], GameResult::WhiteWins, 1600);
        let record = GameRecord::new(GameResult::Draw, 1500, 1500, None, 0);
        let err = graph
            .add_game(record, &[], START, PieceColor::Black)
            .unwrap_err();
        assert!(matches!(err, TreeError::ColorMismatch { .. }));
        assert_eq!(graph.games().len(), 1);
    }

    #[test]
    fn test_malformed_transition_leaves_graph_untouched() {
        let mut graph = OpeningGraph::new(START).unwrap();
        let bad = MoveTransition {
            source_fen: START.into(),
            target_fen: "broken".into(),
            san: "e4".into(),
        };
        let record = GameRecord::new(GameResult::Draw, 1500, 1500, None, 1);
        assert!(graph
            .add_game(record, &[bad], START, PieceColor::White)
            .is_err());
        assert!(graph.games().is_empty());
        assert_eq!(graph.position_count(), 0);
        assert_eq!(graph.player_color(), None);
    }

    #[test]
    fn test_game_results_for_final_position() {
        let mut graph = OpeningGraph::new(START).unwrap();
        add(&mut graph, &["e4", "e5"], GameResult::WhiteWins, 1600);
        add(&mut graph, &["e4"], GameResult::BlackWins, 1600);
        add(&mut graph, &["e4", "e5"], GameResult::Draw, 1600);
        let results = graph.game_results_for(&fen_after(&["e4", "e5"])).unwrap();
        let indices: Vec<_> = results.iter().map(|g| g.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_moves_for_levels_and_details() {
        let mut graph = OpeningGraph::new(START).unwrap();
        for _ in 0..9 {
            add(&mut graph, &["e4"], GameResult::WhiteWins, 1600);
        }
        add(&mut graph, &["d4"], GameResult::Draw, 1600);
        add(&mut graph, &["c4"], GameResult::Draw, 1600);
        add(&mut graph, &["c4"], GameResult::Draw, 1600);
        add(&mut graph, &["c4"], GameResult::Draw, 1600);

        let rules = CozyRules::standard();
        let moves = graph.moves_for(START, None, |_| None, &rules).unwrap();
        let summary: Vec<_> = moves.iter().map(|m| (m.san.as_str(), m.move_count, m.level)).collect();
        assert_eq!(summary, vec![("e4", 9, 3), ("d4", 1, 1), ("c4", 3, 2)]);
        assert_eq!(moves[0].from.as_deref(), Some("e2"));
        assert_eq!(moves[0].details.count, 9);
        assert!(moves.iter().all(|m| !m.is_recommended));
    }

    #[test]
    fn test_moves_for_flags_and_synthesizes_recommendation() {
        let mut graph = OpeningGraph::new(START).unwrap();
        add(&mut graph, &["d4"], GameResult::Draw, 1600);
        let rules = CozyRules::standard();

        let moves = graph
            .moves_for(START, Some(PieceColor::White), |_| Some("d4".into()), &rules)
            .unwrap();
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_recommended);

        let moves = graph
            .moves_for(START, Some(PieceColor::White), |_| Some("e4".into()), &rules)
            .unwrap();
        assert_eq!(moves.len(), 2);
        let synthetic = &moves[1];
        assert_eq!(synthetic.san, "e4");
        assert_eq!(synthetic.move_count, 0);
        assert_eq!(synthetic.level, 3);
        assert!(synthetic.is_recommended);
        assert!(!synthetic.details.has_data);
    }

    #[test]
    fn test_unplayable_recommendation_is_dropped() {
        let graph = OpeningGraph::new(START).unwrap();
        let rules = CozyRules::standard();
        let moves = graph
            .moves_for(START, None, |_| Some("Ke2".into()), &rules)
            .unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn test_recommendation_ignored_for_other_side() {
        let graph = OpeningGraph::new(START).unwrap();
        let rules = CozyRules::standard();
        let moves = graph
            .moves_for(START, Some(PieceColor::Black), |_| Some("e4".into()), &rules)
            .unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn test_last_played_prefers_dated_games() {
        let mut graph = OpeningGraph::new(START).unwrap();
        let rules = CozyRules::standard();
        let (transitions, last) = replay(&rules, &["e4"]);
        let dated = GameRecord::new(GameResult::Draw, 1500, 1500, NaiveDate::from_ymd_opt(2020, 5, 1), 1);
        let undated = GameRecord::new(GameResult::Draw, 1500, 1500, None, 1);
        graph.add_game(undated, &transitions, &last, PieceColor::White).unwrap();
        graph.add_game(dated, &transitions, &last, PieceColor::White).unwrap();
        let details = graph.details_for(&last).unwrap();
        assert_eq!(details.last_played.map(|g| g.index), Some(1));
    }
}
