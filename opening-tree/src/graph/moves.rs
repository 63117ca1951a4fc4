use serde::Serialize;

use super::details::DetailsView;

/// A move offered from a position, with statistics for where it leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCandidate<'g> {
    pub san: String,
    pub uci: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub details: DetailsView<'g>,
    pub move_count: u32,
    pub level: u8,
    pub is_recommended: bool,
}

/// Coarse 1-3 frequency tier of a move relative to the most played move
/// from the same position.
pub fn level_for(count: u32, max: u32) -> u8 {
    if max == 0 {
        return 3;
    }
    let ratio = f64::from(count) / f64::from(max);
    if ratio > 0.8 {
        3
    } else if ratio > 0.3 {
        2
    } else {
        1
    }
}
