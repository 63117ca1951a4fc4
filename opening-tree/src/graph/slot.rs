//! Lazily aggregated statistics for one position.

use std::cmp::{Ordering, Reverse};

use chess::PieceColor;

use crate::record::{GameRecord, PlayerOutcome};

/// Statistics slot of a graph node.
///
/// A position reached by a single game only remembers that game's index;
/// the aggregate is built on the second game. Folding never returns to
/// [`StatsSlot::Single`] once an aggregate exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatsSlot {
    #[default]
    Empty,
    Single(usize),
    Aggregate(AggregateDetails),
}

impl StatsSlot {
    /// Fold `record` into the slot. `games` must contain every index the
    /// slot already refers to.
    pub fn fold(self, record: &GameRecord, games: &[GameRecord], color: PieceColor) -> StatsSlot {
        match self {
            StatsSlot::Empty => StatsSlot::Single(record.index),
            StatsSlot::Single(index) => {
                let mut aggregate = AggregateDetails::default();
                if let Some(first) = games.get(index) {
                    aggregate.absorb(first, games, color);
                }
                aggregate.absorb(record, games, color);
                StatsSlot::Aggregate(aggregate)
            }
            StatsSlot::Aggregate(mut aggregate) => {
                aggregate.absorb(record, games, color);
                StatsSlot::Aggregate(aggregate)
            }
        }
    }

    /// Aggregate equivalent of the slot, built on the fly for the lazy form.
    pub fn materialize(&self, games: &[GameRecord], color: PieceColor) -> Option<AggregateDetails> {
        match self {
            StatsSlot::Empty => None,
            StatsSlot::Single(index) => {
                let mut aggregate = AggregateDetails::default();
                aggregate.absorb(games.get(*index)?, games, color);
                Some(aggregate)
            }
            StatsSlot::Aggregate(aggregate) => Some(aggregate.clone()),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, StatsSlot::Single(_))
    }
}

/// Counts, sums and game indices. Ratios and resolved games are derived
/// on read by [`DetailsView`](super::DetailsView).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateDetails {
    pub white_wins: u32,
    pub black_wins: u32,
    pub draws: u32,
    pub player_wins: u32,
    pub player_losses: u32,
    /// Games whose opponent had a known rating; `total_opponent_elo` sums only these.
    pub rated_games: u32,
    pub total_opponent_elo: u64,
    pub best_win: Option<usize>,
    pub worst_loss: Option<usize>,
    pub last_played: Option<usize>,
    pub longest_game: Option<usize>,
    pub shortest_game: Option<usize>,
}

impl AggregateDetails {
    pub fn count(&self) -> u32 {
        self.white_wins + self.black_wins + self.draws
    }

    pub fn absorb(&mut self, record: &GameRecord, games: &[GameRecord], color: PieceColor) {
        match record.outcome_for(PieceColor::White) {
            PlayerOutcome::Win => self.white_wins += 1,
            PlayerOutcome::Loss => self.black_wins += 1,
            PlayerOutcome::Draw => self.draws += 1,
        }
        let rated = record.opponent_elo(color).is_some();
        if let Some(elo) = record.opponent_elo(color) {
            self.rated_games += 1;
            self.total_opponent_elo += u64::from(elo);
        }

        // Unrated opponents never become the best win or worst loss.
        match record.outcome_for(color) {
            PlayerOutcome::Win => {
                self.player_wins += 1;
                if rated {
                    self.best_win = prefer(self.best_win, record, games, |g| g.opponent_elo(color));
                }
            }
            PlayerOutcome::Loss => {
                self.player_losses += 1;
                if rated {
                    self.worst_loss =
                        prefer(self.worst_loss, record, games, |g| Reverse(g.opponent_elo(color)));
                }
            }
            PlayerOutcome::Draw => {}
        }

        // Option orders None first, so undated games lose to any dated one.
        self.last_played = prefer(self.last_played, record, games, |g| g.date);
        self.longest_game = prefer(self.longest_game, record, games, |g| g.number_of_plys);
        self.shortest_game =
            prefer(self.shortest_game, record, games, |g| Reverse(g.number_of_plys));
    }
}

/// Keep whichever of `current` and `candidate` ranks higher; equal ranks keep
/// the lower game index so the choice does not depend on folding order.
fn prefer<K: Ord>(
    current: Option<usize>,
    candidate: &GameRecord,
    games: &[GameRecord],
    rank: impl Fn(&GameRecord) -> K,
) -> Option<usize> {
    let Some(existing) = current.and_then(|i| games.get(i)) else {
        return Some(candidate.index);
    };
    let chosen = match rank(candidate).cmp(&rank(existing)) {
        Ordering::Greater => candidate.index,
        Ordering::Less => existing.index,
        Ordering::Equal => existing.index.min(candidate.index),
    };
    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::GameResult;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn games(specs: &[(GameResult, u32, Option<(i32, u32, u32)>, u32)]) -> Vec<GameRecord> {
        specs
            .iter()
            .enumerate()
            .map(|(i, (result, black_elo, date, plys))| {
                let date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
                let mut record = GameRecord::new(*result, 1500, *black_elo, date, *plys);
                record.index = i;
                record
            })
            .collect()
    }

    fn fold_all(order: &[usize], games: &[GameRecord]) -> StatsSlot {
        order.iter().fold(StatsSlot::Empty, |slot, &i| {
            slot.fold(&games[i], games, PieceColor::White)
        })
    }

    #[test]
    fn test_first_fold_is_lazy() {
        let games = games(&[(GameResult::WhiteWins, 1600, None, 40)]);
        let slot = StatsSlot::Empty.fold(&games[0], &games, PieceColor::White);
        assert_eq!(slot, StatsSlot::Single(0));

        let mut explicit = AggregateDetails::default();
        explicit.absorb(&games[0], &games, PieceColor::White);
        assert_eq!(slot.materialize(&games, PieceColor::White), Some(explicit));
    }

    #[test]
    fn test_second_fold_promotes() {
        let games = games(&[
            (GameResult::WhiteWins, 1600, None, 40),
            (GameResult::BlackWins, 1400, Some((2024, 1, 2)), 22),
        ]);
        let slot = fold_all(&[0, 1], &games);
        let StatsSlot::Aggregate(agg) = &slot else {
            panic!("expected aggregate, got {slot:?}");
        };
        assert_eq!(agg.count(), 2);
        assert_eq!(agg.white_wins, 1);
        assert_eq!(agg.black_wins, 1);
        assert_eq!(agg.total_opponent_elo, 3000);
        assert_eq!(agg.best_win, Some(0));
        assert_eq!(agg.worst_loss, Some(1));
        assert_eq!(agg.last_played, Some(1));
        assert_eq!(agg.longest_game, Some(0));
        assert_eq!(agg.shortest_game, Some(1));

        // stays an aggregate
        let third = slot.fold(&games[0], &games, PieceColor::White);
        assert!(matches!(third, StatsSlot::Aggregate(_)));
    }

    #[test]
    fn test_extremal_ties_keep_lower_index() {
        let games = games(&[
            (GameResult::WhiteWins, 1700, Some((2024, 3, 1)), 30),
            (GameResult::WhiteWins, 1700, Some((2024, 3, 1)), 30),
        ]);
        for order in [[0, 1], [1, 0]] {
            let slot = fold_all(&order, &games);
            let agg = slot.materialize(&games, PieceColor::White).unwrap();
            assert_eq!(agg.best_win, Some(0));
            assert_eq!(agg.last_played, Some(0));
            assert_eq!(agg.longest_game, Some(0));
            assert_eq!(agg.shortest_game, Some(0));
        }
    }

    #[test]
    fn test_dated_game_beats_undated() {
        let games = games(&[
            (GameResult::Draw, 1500, None, 30),
            (GameResult::Draw, 1500, Some((2001, 1, 1)), 30),
        ]);
        let agg = fold_all(&[1, 0], &games).materialize(&games, PieceColor::White).unwrap();
        assert_eq!(agg.last_played, Some(1));
        assert_eq!(agg.draws, 2);
        assert_eq!(agg.best_win, None);
    }

    #[test]
    fn test_unrated_opponent_left_out_of_elo_stats() {
        let mut games = games(&[
            (GameResult::BlackWins, 0, None, 30),
            (GameResult::BlackWins, 1500, None, 40),
            (GameResult::WhiteWins, 0, None, 50),
        ]);
        games[0].black_elo = None;
        games[2].black_elo = None;

        for order in [[0, 1, 2], [2, 1, 0]] {
            let agg = fold_all(&order, &games).materialize(&games, PieceColor::White).unwrap();
            assert_eq!(agg.player_losses, 2);
            assert_eq!(agg.player_wins, 1);
            assert_eq!(agg.rated_games, 1);
            assert_eq!(agg.total_opponent_elo, 1500);
            assert_eq!(agg.worst_loss, Some(1));
            assert_eq!(agg.best_win, None);
        }
    }

    fn result_strategy() -> impl Strategy<Value = GameResult> {
        prop_oneof![
            Just(GameResult::WhiteWins),
            Just(GameResult::BlackWins),
            Just(GameResult::Draw),
            Just(GameResult::Ongoing),
        ]
    }

    proptest! {
        #[test]
        fn test_fold_is_order_independent(
            specs in prop::collection::vec(
                (result_strategy(), 1000u32..2800, prop::option::of((2000i32..2025, 1u32..13, 1u32..29)), 1u32..120),
                2..12,
            ),
            seed in any::<u64>(),
        ) {
            let games = games(&specs);
            let forward: Vec<usize> = (0..games.len()).collect();
            let mut shuffled = forward.clone();
            // deterministic permutation from the seed
            let len = shuffled.len();
            for i in (1..len).rev() {
                let j = (seed.rotate_left(i as u32) as usize) % (i + 1);
                shuffled.swap(i, j);
            }

            let a = fold_all(&forward, &games).materialize(&games, PieceColor::White).unwrap();
            let b = fold_all(&shuffled, &games).materialize(&games, PieceColor::White).unwrap();
            prop_assert_eq!(&a, &b);

            let white_wins = specs.iter().filter(|s| s.0 == GameResult::WhiteWins).count() as u32;
            let black_wins = specs.iter().filter(|s| s.0 == GameResult::BlackWins).count() as u32;
            let elo: u64 = specs.iter().map(|s| u64::from(s.1)).sum();
            prop_assert_eq!(a.white_wins, white_wins);
            prop_assert_eq!(a.black_wins, black_wins);
            prop_assert_eq!(a.count() as usize, specs.len());
            prop_assert_eq!(a.rated_games as usize, specs.len());
            prop_assert_eq!(a.total_opponent_elo, elo);
        }
    }
}
