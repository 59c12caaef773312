//! Matching rules that drive the extraction engine.

use serde::{Deserialize, Serialize};

/// Identifier value marking a rule as a pointer to its publisher's
/// standard rule set rather than a concrete rule of its own.
pub const PUBLISHER_STANDARD: &str = "$publisher-standard";

/// Normalize a lookup key (journal, publisher, tag name) to its canonical
/// lowercase form.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// One declarative matching rule for a journal's page layout.
///
/// Rules are parsed once from the rules file at startup and owned by the
/// registry; the engine borrows them per document. A journal usually has a
/// single rule, but publishers with several layout generations register one
/// rule per generation and let journals point at the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Publisher that owns this rule (normalized key)
    pub publisher: String,

    /// Journal this rule applies to (normalized key)
    pub journal: String,

    /// CSS selector locating the article title
    pub title_selector: String,

    /// Element name the identifier search is scoped to, when present
    pub scope_tag: Option<String>,

    /// Literal heading text that labels the data availability statement
    pub identifier: String,

    /// Element name tried when hunting the statement body near its heading
    pub search_tag: String,

    /// CSS selector locating author name elements
    pub author_selector: String,

    /// CSS selector for surname elements paired positionally with the
    /// primary author matches
    pub author_secondary: Option<String>,

    /// Take each author name from the element's first direct child link
    /// instead of its own text
    pub author_via_link: bool,
}

impl Rule {
    /// Whether this rule is a pointer to be expanded into the publisher's
    /// concrete rules at resolution time.
    pub fn is_publisher_standard(&self) -> bool {
        self.identifier == PUBLISHER_STANDARD
    }
}
