//! Article identity flowing through the harvest passes.

use serde::{Deserialize, Serialize};

use super::rule::normalize_key;

/// One document to process: the journal whose rules apply, and the link to
/// fetch it from. Immutable once loaded; the runner clones these between
/// pass working sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Article {
    /// Journal key (normalized)
    pub journal: String,

    /// Page URL (normalized)
    pub link: String,
}

impl Article {
    /// Create an article, normalizing both fields.
    pub fn new(journal: impl Into<String>, link: impl Into<String>) -> Self {
        let journal: String = journal.into();
        let link: String = link.into();
        Self {
            journal: normalize_key(&journal),
            link: normalize_key(&link),
        }
    }
}

impl std::fmt::Display for Article {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.link, self.journal)
    }
}
