//! Opening statistics for a player's games.
//!
//! Games are folded into a graph of positions keyed by piece placement and
//! side to move, with per-position results aggregated lazily. A repertoire
//! loaded from PGN (variations included) can be compared against played
//! sequences, and opening-book lookups are merged per position.

pub mod book;
pub mod config;
pub mod error;
pub mod explorer;
pub mod flatten;
pub mod graph;
pub mod loader;
pub mod record;
pub mod repertoire;

pub use book::{BookFetcher, BookMove, BookQuery, BookSource, FetchStatus};
pub use config::TreeConfig;
pub use error::{FormatError, TreeError, TreeResult};
pub use explorer::OpeningExplorer;
pub use flatten::{flatten_pgn, Variation};
pub use graph::{DetailsView, MoveCandidate, OpeningGraph};
pub use loader::{GameFilter, LoadReport};
pub use record::GameRecord;
pub use repertoire::{Deviation, Repertoire, RepertoireComparison};
