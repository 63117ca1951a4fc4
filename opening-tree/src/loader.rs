//! Loading batches of parsed games into an [`OpeningGraph`].

use chess::{MoveRules, PgnGame, PieceColor};
use serde::Serialize;

use crate::error::{TreeError, TreeResult};
use crate::graph::{MoveTransition, OpeningGraph};
use crate::record::GameRecord;

/// Opponent ratings at or above this value are treated as unbounded.
pub const MAX_ELO_RATING: u32 = 3000;

/// Which games of a batch to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Only games where this player (case-insensitive) had the tracked color.
    pub player: Option<String>,
    /// Inclusive opponent rating band.
    pub opponent_elo: Option<(u32, u32)>,
}

impl GameFilter {
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            player: Some(name.into()),
            opponent_elo: None,
        }
    }

    pub fn with_opponent_elo(mut self, min: u32, max: u32) -> Self {
        self.opponent_elo = Some((min, max));
        self
    }

    pub fn accepts(&self, record: &GameRecord, color: PieceColor) -> bool {
        if let Some(player) = &self.player {
            if !record.player_name(color).eq_ignore_ascii_case(player) {
                return false;
            }
        }
        if let Some((min, max)) = self.opponent_elo {
            // an unrated opponent is outside any band
            let Some(elo) = record.opponent_elo(color) else {
                return false;
            };
            if elo < min || (max < MAX_ELO_RATING && elo > max) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedGame {
    /// Position of the game within the batch.
    pub batch_index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub loaded: usize,
    pub filtered: usize,
    pub skipped: Vec<SkippedGame>,
}

/// A game replayed and ready to be added to a graph.
#[derive(Debug, Clone)]
pub struct PreparedGame {
    pub record: GameRecord,
    pub transitions: Vec<MoveTransition>,
    pub final_fen: String,
}

/// Replay a game's main line, from its `FEN` header when present.
/// `record` is the game's already-parsed header record.
pub fn prepare_game<R: MoveRules + ?Sized>(
    game: &PgnGame,
    record: GameRecord,
    rules: &R,
) -> TreeResult<PreparedGame> {
    let mut fen = match game.tag("FEN") {
        Some(fen) => chess::complete_fen(fen)?,
        None => rules.start_fen(),
    };
    let mut transitions = Vec::with_capacity(game.moves.len());
    for san in game.sans() {
        let applied = rules.play(&fen, san)?;
        transitions.push(MoveTransition {
            source_fen: fen,
            target_fen: applied.fen_after.clone(),
            san: applied.san,
        });
        fen = applied.fen_after;
    }
    Ok(PreparedGame {
        record,
        transitions,
        final_fen: fen,
    })
}

/// Load a batch of games played with `color`.
///
/// Every game is prepared before the graph is touched, so a format error
/// anywhere in the batch leaves the graph unchanged. Games with an illegal
/// move are skipped and reported.
pub fn load_games<R: MoveRules + ?Sized>(
    graph: &mut OpeningGraph,
    rules: &R,
    games: &[PgnGame],
    color: PieceColor,
    filter: &GameFilter,
) -> TreeResult<LoadReport> {
    graph.check_color(color)?;

    let mut report = LoadReport::default();
    let mut prepared = Vec::with_capacity(games.len());
    for (batch_index, game) in games.iter().enumerate() {
        let record = GameRecord::from_pgn(game)?;
        if !filter.accepts(&record, color) {
            report.filtered += 1;
            continue;
        }
        match prepare_game(game, record, rules) {
            Ok(game) => prepared.push(game),
            Err(err @ TreeError::IllegalMove { .. }) => {
                tracing::warn!(batch_index, error = %err, "Skipping game with unplayable move");
                report.skipped.push(SkippedGame {
                    batch_index,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    for game in prepared {
        graph.add_game(game.record, &game.transitions, &game.final_fen, color)?;
        report.loaded += 1;
    }

    tracing::info!(
        %color,
        loaded = report.loaded,
        filtered = report.filtered,
        skipped = report.skipped.len(),
        "Game batch loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{parse_pgn, CozyRules, GameResult};

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    const BATCH: &str = r#"[White "alice"]
[Black "bob"]
[WhiteElo "1500"]
[BlackElo "1700"]
[Result "1-0"]

1. e4 e5 2. Nf3 1-0

[White "carol"]
[Black "alice"]
[WhiteElo "2100"]
[BlackElo "1500"]
[Result "0-1"]

1. d4 d5 0-1

[White "Alice"]
[Black "dave"]
[WhiteElo "1500"]
[BlackElo "1200"]
[Result "*"]

1. e4 c5 2. Ke3 *
"#;

    #[test]
    fn test_load_skips_illegal_games() {
        let rules = CozyRules::standard();
        let mut graph = OpeningGraph::new(START).unwrap();
        let games = parse_pgn(BATCH).unwrap();
        let report = load_games(&mut graph, &rules, &games, PieceColor::White, &GameFilter::default()).unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].batch_index, 2);
        assert_eq!(graph.games().len(), 2);
        assert_eq!(graph.games()[1].result, GameResult::BlackWins);
        assert_eq!(graph.player_color(), Some(PieceColor::White));
    }

    #[test]
    fn test_player_filter_is_case_insensitive() {
        let rules = CozyRules::standard();
        let mut graph = OpeningGraph::new(START).unwrap();
        let games = parse_pgn(BATCH).unwrap();
        let report = load_games(
            &mut graph,
            &rules,
            &games,
            PieceColor::White,
            &GameFilter::player("ALICE"),
        )
        .unwrap();
        assert_eq!(report.filtered, 1);
        assert_eq!(report.loaded, 1);
        assert_eq!(graph.games()[0].black, "bob");
    }

    #[test]
    fn test_opponent_elo_band() {
        let record = GameRecord::new(GameResult::Draw, 1500, 2900, None, 10);
        assert!(GameFilter::default().with_opponent_elo(1000, MAX_ELO_RATING).accepts(&record, PieceColor::White));
        assert!(!GameFilter::default().with_opponent_elo(1000, 2000).accepts(&record, PieceColor::White));
        assert!(!GameFilter::default().with_opponent_elo(1600, 2000).accepts(&record, PieceColor::Black));
    }

    #[test]
    fn test_unrated_opponent_outside_elo_band() {
        let mut record = GameRecord::new(GameResult::Draw, 1500, 1500, None, 10);
        record.black_elo = None;
        assert!(GameFilter::default().accepts(&record, PieceColor::White));
        assert!(!GameFilter::default().with_opponent_elo(0, MAX_ELO_RATING).accepts(&record, PieceColor::White));
    }

    #[test]
    fn test_unrated_loss_does_not_skew_details() {
        let rules = CozyRules::standard();
        let mut graph = OpeningGraph::new(START).unwrap();
        let games = parse_pgn(
            r#"[White "alice"]
[Black "bob"]
[WhiteElo "1500"]
[BlackElo "?"]
[Result "0-1"]

1. e4 e5 0-1

[White "alice"]
[Black "carol"]
[WhiteElo "1500"]
[BlackElo "1500"]
[Result "0-1"]

1. d4 d5 0-1
"#,
        )
        .unwrap();
        let report = load_games(&mut graph, &rules, &games, PieceColor::White, &GameFilter::default()).unwrap();
        assert_eq!(report.loaded, 2);

        let details = graph.details_for(START).unwrap();
        assert_eq!(details.player_losses, 2);
        assert_eq!(details.rated_games, 1);
        assert_eq!(details.average_opponent_elo, Some(1500));
        let worst = details.worst_loss.unwrap();
        assert_eq!(worst.game.index, 1);
        assert_eq!(worst.opponent_elo, 1500);
    }

    #[test]
    fn test_format_error_aborts_whole_batch() {
        let rules = CozyRules::standard();
        let mut graph = OpeningGraph::new(START).unwrap();
        let mut games = parse_pgn(BATCH).unwrap();
        games[1].tags.insert("BlackElo".into(), "unrated".into());

        let err = load_games(&mut graph, &rules, &games, PieceColor::White, &GameFilter::default()).unwrap_err();
        assert!(matches!(err, TreeError::Format(_)));
        assert!(graph.games().is_empty());
        assert_eq!(graph.position_count(), 0);
    }

    #[test]
    fn test_color_mismatch_checked_before_loading() {
        let rules = CozyRules::standard();
        let mut graph = OpeningGraph::new(START).unwrap();
        let games = parse_pgn(BATCH).unwrap();
        load_games(&mut graph, &rules, &games[..1], PieceColor::White, &GameFilter::default()).unwrap();
        let err = load_games(&mut graph, &rules, &games, PieceColor::Black, &GameFilter::default()).unwrap_err();
        assert!(matches!(err, TreeError::ColorMismatch { .. }));
        assert_eq!(graph.games().len(), 1);
    }

    #[test]
    fn test_prepare_game_from_fen_header() {
        let rules = CozyRules::standard();
        let game = parse_pgn("[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n1. e4 Kd7 *")
            .unwrap()
            .remove(0);
        let record = GameRecord::from_pgn(&game).unwrap();
        let prepared = prepare_game(&game, record, &rules).unwrap();
        assert_eq!(prepared.transitions.len(), 2);
        assert!(prepared.final_fen.starts_with("8/3k4/8/8/4P3/8/8/4K3 w"));
    }
}
