//! Opening-book lookups served from a JSON file.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chess::position_key;
use opening_tree::book::{BookError, BookMove, BookQuery, BookSource};

/// Reads `{ "<fen>": [BookMove, ...], ... }` on every lookup. Keys may be
/// full FENs or position keys.
pub struct JsonBookSource {
    path: PathBuf,
}

impl JsonBookSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BookSource for JsonBookSource {
    async fn fetch(&self, query: BookQuery) -> Result<Vec<BookMove>, BookError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| BookError::Lookup(format!("{}: {}", self.path.display(), e)))?;
        let entries: HashMap<String, Vec<BookMove>> =
            serde_json::from_str(&text).map_err(|e| BookError::Lookup(e.to_string()))?;

        let wanted = position_key(&query.fen).map_err(|e| BookError::Lookup(e.to_string()))?;
        Ok(entries
            .into_iter()
            .find(|(fen, _)| position_key(fen).is_ok_and(|key| key == wanted))
            .map(|(_, moves)| moves)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(fen: &str) -> BookQuery {
        BookQuery {
            fen: fen.to_string(),
            variant: "standard".into(),
            ratings: vec![2000],
            speeds: vec!["blitz".into()],
        }
    }

    #[tokio::test]
    async fn test_lookup_by_position_key() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("book.json");
        std::fs::write(
            &path,
            r#"{"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w": [
                {"san": "e4", "white": 10, "black": 7, "draws": 3, "averageRating": 2010}
            ]}"#,
        )
        .unwrap();

        let source = JsonBookSource::new(path);
        let moves = source
            .fetch(query("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"))
            .await
            .unwrap();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].san, "e4");

        let none = source.fetch(query("8/8/8/8/8/8/8/K6k w - - 0 1")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_lookup_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let source = JsonBookSource::new(dir.path().join("absent.json"));
        let err = source.fetch(query("8/8/8/8/8/8/8/K6k w")).await.unwrap_err();
        assert!(matches!(err, BookError::Lookup(_)));
    }
}
