//! Configuration for the opening tree
//!
//! Every value can be overridden through an environment variable; anything
//! missing or unparsable falls back to the compiled-in default.

const DEFAULT_MAX_MOVES_TO_COMPARE: usize = 10;
const DEFAULT_BOOK_RATINGS: &[u32] = &[1600, 1800, 2000, 2200, 2500];
const DEFAULT_BOOK_SPEEDS: &[&str] = &["blitz", "rapid", "classical"];
const DEFAULT_BOOK_VARIANT: &str = "standard";

pub const MAX_MOVES_TO_COMPARE_VAR: &str = "OPENING_TREE_MAX_MOVES_TO_COMPARE";
pub const BOOK_RATINGS_VAR: &str = "OPENING_TREE_BOOK_RATINGS";
pub const BOOK_SPEEDS_VAR: &str = "OPENING_TREE_BOOK_SPEEDS";

/// Upper bound on played moves examined by a repertoire comparison.
pub fn get_max_moves_to_compare() -> usize {
    std::env::var(MAX_MOVES_TO_COMPARE_VAR)
        .ok()
        .and_then(|v| parse_max_moves(&v))
        .unwrap_or(DEFAULT_MAX_MOVES_TO_COMPARE)
}

/// Rating buckets sent with opening-book lookups.
pub fn get_book_ratings() -> Vec<u32> {
    std::env::var(BOOK_RATINGS_VAR)
        .ok()
        .and_then(|v| parse_list(&v, |s| s.parse().ok()))
        .unwrap_or_else(|| DEFAULT_BOOK_RATINGS.to_vec())
}

/// Time controls sent with opening-book lookups.
pub fn get_book_speeds() -> Vec<String> {
    std::env::var(BOOK_SPEEDS_VAR)
        .ok()
        .and_then(|v| parse_list(&v, |s| Some(s.to_string())))
        .unwrap_or_else(default_speeds)
}

fn default_speeds() -> Vec<String> {
    DEFAULT_BOOK_SPEEDS.iter().map(|s| s.to_string()).collect()
}

fn parse_max_moves(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|&n| n > 0)
}

/// Comma-separated list; `None` when empty or any element fails to parse.
fn parse_list<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let items: Option<Vec<T>> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse)
        .collect();
    items.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSettings {
    pub variant: String,
    pub ratings: Vec<u32>,
    pub speeds: Vec<String>,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            variant: DEFAULT_BOOK_VARIANT.to_string(),
            ratings: DEFAULT_BOOK_RATINGS.to_vec(),
            speeds: default_speeds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    pub max_moves_to_compare: usize,
    pub book: BookSettings,
}

impl TreeConfig {
    pub fn from_env() -> Self {
        Self {
            max_moves_to_compare: get_max_moves_to_compare(),
            book: BookSettings {
                ratings: get_book_ratings(),
                speeds: get_book_speeds(),
                ..BookSettings::default()
            },
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_moves_to_compare: DEFAULT_MAX_MOVES_TO_COMPARE,
            book: BookSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TreeConfig::default();
        assert_eq!(config.max_moves_to_compare, 10);
        assert_eq!(config.book.ratings, vec![1600, 1800, 2000, 2200, 2500]);
        assert_eq!(config.book.speeds, vec!["blitz", "rapid", "classical"]);
        assert_eq!(config.book.variant, "standard");
    }

    #[test]
    fn test_parse_max_moves() {
        assert_eq!(parse_max_moves(" 12 "), Some(12));
        assert_eq!(parse_max_moves("0"), None);
        assert_eq!(parse_max_moves("ten"), None);
    }

    #[test]
    fn test_parse_list() {
        let ratings = parse_list("1800, 2000,,2200", |s| s.parse::<u32>().ok());
        assert_eq!(ratings, Some(vec![1800, 2000, 2200]));
        assert_eq!(parse_list("1800,high", |s| s.parse::<u32>().ok()), None);
        assert_eq!(parse_list(" , ", |s| Some(s.to_string())), None);
    }

    // Env-var overrides are not exercised here to avoid cross-test pollution.
}
