//! Classified extraction outcomes.

use serde::{Deserialize, Serialize};

/// Classification of one scan (statement or authors) over one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Exactly one match; the data was extracted.
    Found,
    /// No rule produced a match.
    NotFound,
    /// A rule matched more than one candidate; left for manual review.
    Ambiguous,
    /// Every applicable rule failed to evaluate.
    Failed,
}

impl SearchStatus {
    /// One-character code shown on the live status line.
    pub fn code(&self) -> char {
        match self {
            SearchStatus::Found => '+',
            SearchStatus::NotFound => '-',
            SearchStatus::Ambiguous => '?',
            SearchStatus::Failed => '!',
        }
    }

    /// Whether this outcome means the data was not obtained. Ambiguous
    /// counts as obtained: the page has the data, it just needs a human.
    pub fn is_miss(&self) -> bool {
        matches!(self, SearchStatus::NotFound | SearchStatus::Failed)
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SearchStatus::Found => "found",
            SearchStatus::NotFound => "not found",
            SearchStatus::Ambiguous => "ambiguous",
            SearchStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Everything extracted from one document, ready for the output row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Journal key the document was processed under
    pub journal: String,

    /// Article title, empty when unresolvable
    pub title: String,

    /// Deduplicated author names, comma-separated
    pub authors: String,

    /// Page URL
    pub link: String,

    /// Data availability statement text, empty unless found
    pub statement: String,

    /// Free-text annotations accumulated during the scans
    pub notes: String,

    /// Outcome of the statement scan
    pub statement_status: SearchStatus,

    /// Outcome of the author scan
    pub author_status: SearchStatus,
}

impl ExtractionResult {
    /// Paired status codes for the live status line, statement first.
    pub fn status_codes(&self) -> String {
        format!(
            "[{}][{}]",
            self.statement_status.code(),
            self.author_status.code()
        )
    }

    /// True when neither scan obtained data; the aggregator uses this to
    /// decide whether another pass is worth attempting.
    pub fn found_nothing(&self) -> bool {
        self.statement_status.is_miss() && self.author_status.is_miss()
    }
}
