//! Configuration recognized by the differ.

use std::collections::HashSet;

/// Extensions with matching case-sensitive names are filtered from both
/// sides of the diff: never added, never removed.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub ignored_extensions: HashSet<String>,
}

fn default_ignored_extensions() -> HashSet<String> {
    let mut set = HashSet::new();
    set.insert("plpgsql".to_string());
    set
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            ignored_extensions: default_ignored_extensions(),
        }
    }
}

impl CompareOptions {
    pub fn default() -> Self {
        <Self as Default>::default()
    }

    /// Replaces the ignore list entirely.
    pub fn with(ignored_extensions: impl IntoIterator<Item = String>) -> Self {
        CompareOptions {
            ignored_extensions: ignored_extensions.into_iter().collect(),
        }
    }

    /// Unions the given names with the default ignore list.
    pub fn with_additional(additional: impl IntoIterator<Item = String>) -> Self {
        let mut ignored_extensions = default_ignored_extensions();
        ignored_extensions.extend(additional);
        CompareOptions { ignored_extensions }
    }
}
