//! Host-facing entry point tying the graph, repertoire and book together.

use chess::{complete_fen, position_key, MoveRules, PgnGame, PieceColor};

use crate::book::{AnnotatedBookMove, BookMove, BookQuery};
use crate::config::TreeConfig;
use crate::error::TreeResult;
use crate::graph::{level_for, DetailsView, MoveCandidate, OpeningGraph};
use crate::loader::{load_games, GameFilter, LoadReport};
use crate::record::GameRecord;
use crate::repertoire::{Repertoire, RepertoireComparison};

/// Owns one player's opening graph and the currently loaded repertoire.
///
/// All operations are synchronous; a multi-threaded host must serialize
/// access itself.
pub struct OpeningExplorer<R> {
    rules: R,
    config: TreeConfig,
    graph: OpeningGraph,
    repertoire: Option<Repertoire>,
}

impl<R: MoveRules> OpeningExplorer<R> {
    pub fn new(rules: R, config: TreeConfig) -> TreeResult<Self> {
        let graph = OpeningGraph::new(&rules.start_fen())?;
        Ok(Self {
            rules,
            config,
            graph,
            repertoire: None,
        })
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn graph(&self) -> &OpeningGraph {
        &self.graph
    }

    pub fn repertoire(&self) -> Option<&Repertoire> {
        self.repertoire.as_ref()
    }

    pub fn load_games(
        &mut self,
        games: &[PgnGame],
        color: PieceColor,
        filter: &GameFilter,
    ) -> TreeResult<LoadReport> {
        load_games(&mut self.graph, &self.rules, games, color, filter)
    }

    /// Replace the repertoire. On failure the previous one stays active.
    pub fn load_repertoire(&mut self, text: &str, color: PieceColor) -> TreeResult<&Repertoire> {
        let repertoire = Repertoire::load(text, color, &self.rules)?;
        Ok(self.repertoire.insert(repertoire))
    }

    pub fn clear_repertoire(&mut self) {
        self.repertoire = None;
    }

    /// Drop every loaded game and stored book result.
    pub fn clear_games(&mut self) -> TreeResult<()> {
        self.graph = OpeningGraph::new(&self.rules.start_fen())?;
        Ok(())
    }

    pub fn moves_for(&self, fen: &str) -> TreeResult<Vec<MoveCandidate<'_>>> {
        let repertoire = self.repertoire.as_ref();
        self.graph.moves_for(
            fen,
            repertoire.map(Repertoire::color),
            |key| repertoire.and_then(|r| r.recommended_for_key(key)).map(str::to_string),
            &self.rules,
        )
    }

    pub fn details_for(&self, fen: &str) -> TreeResult<DetailsView<'_>> {
        self.graph.details_for(fen)
    }

    pub fn game_results_for(&self, fen: &str) -> TreeResult<Vec<&GameRecord>> {
        self.graph.game_results_for(fen)
    }

    /// Lookup request for a position using the configured book settings.
    pub fn book_query(&self, fen: &str) -> TreeResult<BookQuery> {
        let settings = &self.config.book;
        Ok(BookQuery {
            fen: complete_fen(fen)?,
            variant: settings.variant.clone(),
            ratings: settings.ratings.clone(),
            speeds: settings.speeds.clone(),
        })
    }

    pub fn merge_book_result(&mut self, fen: &str, moves: &[BookMove]) -> TreeResult<()> {
        let color = self.repertoire.as_ref().map(Repertoire::color);
        self.graph.merge_book_result(fen, moves, color)?;
        Ok(())
    }

    /// Stored book moves for a position, each marked with how often the
    /// player chose it and whether the repertoire recommends it. `None` when
    /// no book result was merged for the position.
    pub fn book_moves_for(&self, fen: &str) -> TreeResult<Option<Vec<AnnotatedBookMove>>> {
        let Some(book) = self.graph.book_moves(fen)? else {
            return Ok(None);
        };
        let key = position_key(fen)?;
        let node = self.graph.node(fen)?;
        let recommended = self
            .repertoire
            .as_ref()
            .and_then(|r| r.recommended_for_key(&key));

        let annotated = book
            .moves
            .iter()
            .map(|candidate| {
                let played = node.and_then(|n| {
                    n.played_moves()
                        .find(|(san, _)| *san == candidate.san)
                        .map(|(_, p)| (p.count, level_for(p.count, n.played_move_max())))
                });
                AnnotatedBookMove {
                    candidate: candidate.clone(),
                    is_recommended: recommended == Some(candidate.san.as_str()),
                    player_count: played.map(|(count, _)| count).unwrap_or(0),
                    level: played.map(|(_, level)| level),
                }
            })
            .collect();
        Ok(Some(annotated))
    }

    pub fn clear_book(&mut self) {
        self.graph.clear_book();
    }

    /// Compare a played sequence with the repertoire, `None` when no
    /// repertoire is loaded.
    pub fn compare<S: AsRef<str>>(&self, played: &[S]) -> Option<RepertoireComparison> {
        self.repertoire
            .as_ref()
            .map(|r| r.compare(played, self.config.max_moves_to_compare))
    }
}
