use chess::pgn::normalize_san;
use indexmap::IndexMap;

/// Prefix tree of repertoire lines keyed by SAN.
///
/// Each node remembers its main line: the continuation of the first line
/// inserted through it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieNode {
    children: IndexMap<String, TrieNode>,
    main_line: Vec<String>,
}

impl TrieNode {
    pub fn insert(&mut self, moves: &[String]) {
        let Some((first, rest)) = moves.split_first() else {
            return;
        };
        let child = self.children.entry(first.clone()).or_default();
        child.insert(rest);
        if self.main_line.is_empty() {
            self.main_line = std::iter::once(first.clone())
                .chain(child.main_line.iter().cloned())
                .collect();
        }
    }

    /// Child reached by `san`, ignoring check marks and annotation glyphs.
    pub fn child(&self, san: &str) -> Option<(&str, &TrieNode)> {
        if let Some((key, node)) = self.children.get_key_value(san) {
            return Some((key.as_str(), node));
        }
        let wanted = normalize_san(san);
        self.children
            .iter()
            .find(|(key, _)| normalize_san(key) == wanted)
            .map(|(key, node)| (key.as_str(), node))
    }

    pub fn moves(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn main_line(&self) -> &[String] {
        &self.main_line
    }

    pub fn recommended_move(&self) -> Option<&str> {
        self.main_line.first().map(String::as_str)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn line_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.values().map(TrieNode::line_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_insert_shares_prefixes() {
        let mut root = TrieNode::default();
        root.insert(&line(&["e4", "e5", "Nf3"]));
        root.insert(&line(&["e4", "c5", "Nf3"]));
        root.insert(&line(&["d4"]));

        assert_eq!(root.moves().collect::<Vec<_>>(), vec!["e4", "d4"]);
        assert_eq!(root.line_count(), 3);
        assert_eq!(root.main_line(), line(&["e4", "e5", "Nf3"]).as_slice());

        let (_, after_e4) = root.child("e4").unwrap();
        assert_eq!(after_e4.moves().collect::<Vec<_>>(), vec!["e5", "c5"]);
        assert_eq!(after_e4.recommended_move(), Some("e5"));
    }

    #[test]
    fn test_child_lookup_ignores_suffixes() {
        let mut root = TrieNode::default();
        root.insert(&line(&["Bxf7+"]));
        let (key, node) = root.child("Bxf7").unwrap();
        assert_eq!(key, "Bxf7+");
        assert!(node.is_leaf());
        assert!(root.child("Bxf7!?").is_some());
        assert!(root.child("Bb5").is_none());
    }
}
