pub mod converters;
pub mod fen;
pub mod game;
pub mod pgn;
pub mod rules;
pub mod types;
pub mod uci;

pub use converters::{format_piece, format_square};
pub use fen::{complete_fen, position_key, FenError, PositionKey};
pub use game::{Game, GameError, HistoryEntry, StartPosition};
pub use pgn::{parse_pgn, GameResult, PgnError, PgnGame, PgnMove};
pub use rules::{AppliedMove, CozyRules, MoveRules, RulesError};
pub use types::{PieceColor, PieceKind};
pub use uci::{convert_uci_castling_to_cozy, format_uci_move};
