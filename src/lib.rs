//! # DAS Harvester
//!
//! Harvests data availability statements and author lists from published
//! journal articles, driven by per-journal matching rules.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Article, Rule, extraction outcomes)
//! - [`rules`]: Rule registry with publisher-standard pointer expansion
//! - [`engine`]: Per-document extraction (statement, authors, title)
//! - [`fetch`]: Document fetching with session rotation
//! - [`runner`]: Multi-pass orchestration with retry and carry-over
//! - [`report`]: Per-journal counters and the end-of-run report
//! - [`io`]: CSV loaders and the output sheet sink
//! - [`ui`]: Progress observer trait and the terminal renderer
//! - [`config`]: Settings management

pub mod config;
pub mod engine;
pub mod fetch;
pub mod io;
pub mod models;
pub mod report;
pub mod rules;
pub mod runner;
pub mod ui;

// Re-export commonly used types
pub use models::{Article, ExtractionResult, Rule, SearchStatus};
pub use rules::RuleRegistry;
pub use runner::{RunSummary, Runner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
