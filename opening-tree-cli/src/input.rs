//! Reading PGN files and move lists from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chess::pgn::{tokenize, Token};
use chess::{parse_pgn, PgnGame};

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse every game from every file, in order.
pub fn read_games(paths: &[PathBuf]) -> Result<Vec<PgnGame>> {
    let mut games = Vec::new();
    for path in paths {
        let text = read_text(path)?;
        let parsed =
            parse_pgn(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), games = parsed.len(), "Read PGN file");
        games.extend(parsed);
    }
    Ok(games)
}

/// Moves given either one per argument or as move text (`"1. e4 e5 2. Nf3"`).
pub fn parse_move_list(args: &[String]) -> Result<Vec<String>> {
    let tokens = tokenize(&args.join(" ")).context("invalid move list")?;
    Ok(tokens
        .into_iter()
        .filter_map(|token| match token {
            Token::San(san) => Some(san),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_games_from_multiple_files() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let first = dir.path().join("a.pgn");
        let second = dir.path().join("b.pgn");
        std::fs::write(&first, "[White \"a\"]\n1. e4 e5 1-0\n\n[White \"b\"]\n1. d4 0-1\n").unwrap();
        let mut file = std::fs::File::create(&second).unwrap();
        writeln!(file, "1. c4 e5 1/2-1/2").unwrap();

        let games = read_games(&[first, second]).unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(games[2].moves[0].san, "c4");
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let missing = dir.path().join("missing.pgn");
        let err = read_games(&[missing]).unwrap_err();
        assert!(err.to_string().contains("missing.pgn"));
    }

    #[test]
    fn test_parse_move_list() {
        let moves = parse_move_list(&["1. e4 e5 2. Nf3".to_string()]).unwrap();
        assert_eq!(moves, vec!["e4", "e5", "Nf3"]);
        let moves = parse_move_list(&["d4".to_string(), "Nf6".to_string()]).unwrap();
        assert_eq!(moves, vec!["d4", "Nf6"]);
    }
}
