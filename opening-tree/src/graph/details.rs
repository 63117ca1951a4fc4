use chess::PieceColor;
use serde::Serialize;

use super::slot::AggregateDetails;
use crate::record::GameRecord;

/// Read-only statistics for a position with extremal games resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsView<'g> {
    pub has_data: bool,
    pub count: u32,
    pub white_wins: u32,
    pub black_wins: u32,
    pub draws: u32,
    pub player_wins: u32,
    pub player_losses: u32,
    pub rated_games: u32,
    pub total_opponent_elo: u64,
    /// Over rated opponents only; `None` when none were rated.
    pub average_opponent_elo: Option<u32>,
    pub score_percentage: Option<f64>,
    pub best_win: Option<ExtremalGame<'g>>,
    pub worst_loss: Option<ExtremalGame<'g>>,
    pub last_played: Option<&'g GameRecord>,
    pub longest_game: Option<&'g GameRecord>,
    pub shortest_game: Option<&'g GameRecord>,
}

/// A selected game together with the opponent rating it was chosen by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtremalGame<'g> {
    pub game: &'g GameRecord,
    pub opponent_elo: u32,
}

impl<'g> DetailsView<'g> {
    /// The value returned for positions no game reached.
    pub fn empty() -> Self {
        Self {
            has_data: false,
            count: 0,
            white_wins: 0,
            black_wins: 0,
            draws: 0,
            player_wins: 0,
            player_losses: 0,
            rated_games: 0,
            total_opponent_elo: 0,
            average_opponent_elo: None,
            score_percentage: None,
            best_win: None,
            worst_loss: None,
            last_played: None,
            longest_game: None,
            shortest_game: None,
        }
    }

    pub(crate) fn from_aggregate(
        aggregate: &AggregateDetails,
        games: &'g [GameRecord],
        color: PieceColor,
    ) -> Self {
        let count = aggregate.count();
        if count == 0 {
            return Self::empty();
        }
        let extremal = |index: Option<usize>| {
            let game = index.and_then(|i| games.get(i))?;
            Some(ExtremalGame {
                game,
                opponent_elo: game.opponent_elo(color)?,
            })
        };
        let resolve = |index: Option<usize>| index.and_then(|i| games.get(i));

        let average = (aggregate.rated_games > 0).then(|| {
            (aggregate.total_opponent_elo as f64 / f64::from(aggregate.rated_games)).round() as u32
        });
        let score = (f64::from(aggregate.player_wins) + f64::from(aggregate.draws) / 2.0)
            / f64::from(count)
            * 100.0;

        Self {
            has_data: true,
            count,
            white_wins: aggregate.white_wins,
            black_wins: aggregate.black_wins,
            draws: aggregate.draws,
            player_wins: aggregate.player_wins,
            player_losses: aggregate.player_losses,
            rated_games: aggregate.rated_games,
            total_opponent_elo: aggregate.total_opponent_elo,
            average_opponent_elo: average,
            score_percentage: Some(score),
            best_win: extremal(aggregate.best_win),
            worst_loss: extremal(aggregate.worst_loss),
            last_played: resolve(aggregate.last_played),
            longest_game: resolve(aggregate.longest_game),
            shortest_game: resolve(aggregate.shortest_game),
        }
    }
}

impl Default for DetailsView<'_> {
    fn default() -> Self {
        Self::empty()
    }
}
