//! Runtime settings for the `opening-tree` binary.

use std::path::PathBuf;

/// File name prefix of the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "opening-tree";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Directory for log files from `OPENING_TREE_LOG_DIR`.
///
/// `None` when unset; logging then goes to stderr.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("OPENING_TREE_LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}
