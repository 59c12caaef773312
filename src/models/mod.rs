//! Core data models for matching rules, articles, and extraction outcomes.

mod article;
mod outcome;
mod rule;

pub use article::Article;
pub use outcome::{ExtractionResult, SearchStatus};
pub use rule::{normalize_key, Rule, PUBLISHER_STANDARD};
