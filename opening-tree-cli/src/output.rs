//! Text and JSON rendering of query results.

use anyhow::Result;
use opening_tree::book::AnnotatedBookMove;
use opening_tree::{DetailsView, MoveCandidate, RepertoireComparison, Variation};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovesReport<'a> {
    pub position: String,
    pub details: DetailsView<'a>,
    pub moves: Vec<MoveCandidate<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<Vec<AnnotatedBookMove>>,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn render_details(details: &DetailsView<'_>) -> String {
    if !details.has_data {
        return "no games".to_string();
    }
    let mut text = format!(
        "{} games  +{} ={} -{}",
        details.count, details.player_wins, details.draws, details.player_losses
    );
    if let Some(score) = details.score_percentage {
        text.push_str(&format!("  {:.0}%", score));
    }
    if let Some(avg) = details.average_opponent_elo {
        text.push_str(&format!("  avg opp {}", avg));
    }
    text
}

pub fn render_moves(report: &MovesReport<'_>) -> String {
    let mut lines = vec![
        format!("Position: {}", report.position),
        format!("Overall:  {}", render_details(&report.details)),
    ];
    if let Some(best) = report.details.best_win {
        lines.push(format!(
            "Best win: {} ({})",
            opponent_label(best.game.white.as_str(), best.game.black.as_str()),
            best.opponent_elo
        ));
    }

    if report.moves.is_empty() {
        lines.push("No moves played from this position".to_string());
    }
    for candidate in &report.moves {
        let marker = if candidate.is_recommended { "*" } else { " " };
        lines.push(format!(
            "{} {:<8} {:>4}  tier {}  {}",
            marker,
            candidate.san,
            candidate.move_count,
            candidate.level,
            render_details(&candidate.details)
        ));
    }

    if let Some(book) = &report.book {
        lines.push("Book:".to_string());
        for entry in book {
            let marker = if entry.is_recommended { "*" } else { " " };
            lines.push(format!(
                "{} {:<8} {:>7} games  played {}",
                marker, entry.candidate.san, entry.candidate.move_count, entry.player_count
            ));
        }
    }
    lines.join("\n")
}

fn opponent_label(white: &str, black: &str) -> String {
    format!("{} vs {}", white, black)
}

pub fn render_comparison(comparison: &RepertoireComparison) -> String {
    let mut lines = vec![format!("Matched: {}", comparison.matches.join(" "))];
    match &comparison.deviation {
        Some(deviation) => {
            lines.push(format!(
                "Deviation at move {}: {} played {}",
                deviation.at_move, deviation.color, deviation.played_move
            ));
            lines.push(format!("Repertoire: {}", deviation.repertoire_line.join(" ")));
            if deviation.alternatives.len() > 1 {
                lines.push(format!("Alternatives: {}", deviation.alternatives.join(", ")));
            }
        }
        None => lines.push("No deviation".to_string()),
    }
    lines.join("\n")
}

pub fn render_variations(variations: &[Variation]) -> String {
    variations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
