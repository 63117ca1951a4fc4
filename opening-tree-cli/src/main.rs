//! `opening-tree` command line.
//!
//! Loads a player's games and an optional repertoire from PGN files and
//! prints per-position statistics, repertoire comparisons, or the flattened
//! lines of a PGN file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chess::{position_key, CozyRules, MoveRules, PieceColor};
use clap::{Args, Parser, Subcommand};
use opening_tree::{flatten_pgn, BookFetcher, GameFilter, OpeningExplorer, TreeConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod book_source;
mod config;
mod input;
mod output;

use book_source::JsonBookSource;
use output::MovesReport;

#[derive(Parser)]
#[command(name = "opening-tree", about = "Opening statistics and repertoire checks for PGN games")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the moves played from a position and how they scored.
    Moves(MovesArgs),

    /// Compare a move sequence with a repertoire.
    Compare {
        /// Repertoire PGN file; variations are followed.
        #[arg(long)]
        repertoire: PathBuf,

        /// Side the repertoire is for.
        #[arg(long)]
        color: PieceColor,

        #[arg(long)]
        json: bool,

        /// Moves, one per argument or as move text.
        #[arg(required = true)]
        moves: Vec<String>,
    },

    /// Print every line of a PGN file, variations expanded.
    Flatten {
        pgn: PathBuf,
    },
}

#[derive(Args)]
struct MovesArgs {
    /// PGN files with the player's games.
    #[arg(long, required = true, num_args = 1..)]
    games: Vec<PathBuf>,

    /// Color the player had in these games.
    #[arg(long)]
    color: PieceColor,

    /// Only count games where this player had `--color`.
    #[arg(long)]
    player: Option<String>,

    /// Minimum opponent rating.
    #[arg(long)]
    min_elo: Option<u32>,

    /// Maximum opponent rating.
    #[arg(long)]
    max_elo: Option<u32>,

    #[arg(long, requires = "repertoire_color")]
    repertoire: Option<PathBuf>,

    #[arg(long)]
    repertoire_color: Option<PieceColor>,

    /// Position to query; defaults to the starting position.
    #[arg(long)]
    fen: Option<String>,

    /// JSON file of opening-book moves keyed by FEN.
    #[arg(long)]
    book: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

impl MovesArgs {
    fn filter(&self) -> GameFilter {
        let opponent_elo = match (self.min_elo, self.max_elo) {
            (None, None) => None,
            (min, max) => Some((
                min.unwrap_or(0),
                max.unwrap_or(opening_tree::loader::MAX_ELO_RATING),
            )),
        };
        GameFilter {
            player: self.player.clone(),
            opponent_elo,
        }
    }
}

/// Logs go to a daily file under `OPENING_TREE_LOG_DIR` when set, otherwise
/// to stderr. The returned guard must live until exit.
fn init_tracing() -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    match config::get_log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(&dir, config::LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

async fn run_moves(args: MovesArgs) -> Result<()> {
    let mut explorer = OpeningExplorer::new(CozyRules::standard(), TreeConfig::from_env())?;

    let games = input::read_games(&args.games)?;
    let report = explorer.load_games(&games, args.color, &args.filter())?;
    for skipped in &report.skipped {
        eprintln!("skipped game {}: {}", skipped.batch_index + 1, skipped.reason);
    }

    if let (Some(path), Some(color)) = (&args.repertoire, args.repertoire_color) {
        let text = input::read_text(path)?;
        explorer
            .load_repertoire(&text, color)
            .with_context(|| format!("failed to load repertoire {}", path.display()))?;
    }

    let fen = args
        .fen
        .clone()
        .unwrap_or_else(|| explorer.rules().start_fen());

    if let Some(book_path) = &args.book {
        let query = explorer.book_query(&fen)?;
        let mut fetcher = BookFetcher::new(JsonBookSource::new(book_path.clone()));
        fetcher.request(position_key(&fen)?, query);
        fetcher.apply_next(&mut explorer).await?;
    }

    let report = MovesReport {
        position: position_key(&fen)?.to_string(),
        details: explorer.details_for(&fen)?,
        moves: explorer.moves_for(&fen)?,
        book: explorer.book_moves_for(&fen)?,
    };

    if args.json {
        output::print_json(&report)
    } else {
        println!("{}", output::render_moves(&report));
        Ok(())
    }
}

fn run_compare(repertoire: PathBuf, color: PieceColor, json: bool, moves: Vec<String>) -> Result<()> {
    let mut explorer = OpeningExplorer::new(CozyRules::standard(), TreeConfig::from_env())?;
    let text = input::read_text(&repertoire)?;
    explorer
        .load_repertoire(&text, color)
        .with_context(|| format!("failed to load repertoire {}", repertoire.display()))?;

    let played = input::parse_move_list(&moves)?;
    let comparison = explorer
        .compare(&played)
        .context("no repertoire loaded")?;

    if json {
        output::print_json(&comparison)
    } else {
        println!("{}", output::render_comparison(&comparison));
        Ok(())
    }
}

fn run_flatten(pgn: PathBuf) -> Result<()> {
    let text = input::read_text(&pgn)?;
    let variations =
        flatten_pgn(&text).with_context(|| format!("failed to flatten {}", pgn.display()))?;
    println!("{}", output::render_variations(&variations));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Moves(args) => run_moves(args).await,
        Commands::Compare {
            repertoire,
            color,
            json,
            moves,
        } => run_compare(repertoire, color, json, moves),
        Commands::Flatten { pgn } => run_flatten(pgn),
    }
}
