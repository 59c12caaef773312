//! Pass orchestration: drives every article through fetch, extraction, the
//! output sink and the report, retrying unresolved articles across passes.
//!
//! A pass walks the working set in order, grouped by journal. Articles where
//! neither the statement nor the authors were found go into the next pass's
//! working set; a timeout rebuilds the fetch session and resumes the same
//! pass; any other failure abandons the pass, keeping the rows and counts
//! already earned and carrying the remainder forward. Whatever is still
//! unresolved after the last pass is counted and dropped.

use std::time::Instant;

use tracing::{info, warn};

use crate::engine;
use crate::fetch::DocumentFetcher;
use crate::io::RecordSink;
use crate::models::{Article, Rule};
use crate::report::AnalysisLog;
use crate::rules::RuleRegistry;
use crate::ui::ProgressObserver;

/// Top-level passes over the working set before leftovers are dropped.
pub const DEFAULT_MAX_PASSES: usize = 5;

/// Session rebuilds granted to one article before its timeouts stop being
/// treated as transient.
const TRANSIENT_LIMIT: usize = 3;

/// What a completed run did, for the closing log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Passes actually started
    pub passes: usize,
    /// Rows written (retried articles count once per attempt)
    pub processed: usize,
    /// Session rebuilds after timeouts
    pub transient_restarts: usize,
    /// Passes abandoned by a fatal error
    pub aborted_passes: usize,
    /// Articles dropped unresolved after the final pass
    pub dropped: usize,
}

/// Drives one harvest run. Borrows all its collaborators; the caller keeps
/// ownership and reads results out of the sink and the log afterwards.
pub struct Runner<'a> {
    registry: &'a RuleRegistry,
    fetcher: &'a mut dyn DocumentFetcher,
    sink: &'a mut dyn RecordSink,
    observer: &'a mut dyn ProgressObserver,
    log: &'a mut AnalysisLog,
    max_passes: usize,
}

impl<'a> Runner<'a> {
    pub fn new(
        registry: &'a RuleRegistry,
        fetcher: &'a mut dyn DocumentFetcher,
        sink: &'a mut dyn RecordSink,
        observer: &'a mut dyn ProgressObserver,
        log: &'a mut AnalysisLog,
    ) -> Self {
        Self {
            registry,
            fetcher,
            sink,
            observer,
            log,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Override the pass ceiling. Clamped to at least one pass.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Process the whole article list to completion.
    ///
    /// Never fails: fetch and sink errors shape the pass flow, and whatever
    /// cannot be resolved within the pass ceiling is counted as unresolved
    /// in its journal's report and dropped.
    pub async fn run(mut self, articles: Vec<Article>) -> RunSummary {
        let mut summary = RunSummary {
            passes: 0,
            processed: 0,
            transient_restarts: 0,
            aborted_passes: 0,
            dropped: 0,
        };

        let mut pending = articles;
        for pass in 0..self.max_passes {
            if pending.is_empty() {
                break;
            }
            summary.passes += 1;
            let final_pass = pass + 1 == self.max_passes;
            info!(pass = pass + 1, pending = pending.len(), "pass started");
            self.observer
                .pass_started(pass, self.max_passes, pending.len());

            let (carry, aborted) = self.run_pass(final_pass, &pending, &mut summary).await;
            if aborted {
                summary.aborted_passes += 1;
                if pass + 1 < self.max_passes {
                    if let Err(error) = self.fetcher.reconnect().await {
                        warn!(error = %error, "session rebuild after aborted pass failed");
                    }
                }
            }
            pending = carry;
        }

        summary.dropped = pending.len();
        for article in &pending {
            warn!(link = %article.link, journal = %article.journal, "dropped unresolved");
            self.log.mark_unresolved(&article.journal);
        }

        self.observer.finished();
        info!(
            passes = summary.passes,
            processed = summary.processed,
            dropped = summary.dropped,
            "run complete"
        );
        summary
    }

    /// Work through one pass. Returns the articles to carry into the next
    /// pass and whether this pass was abandoned early.
    async fn run_pass(
        &mut self,
        final_pass: bool,
        working: &[Article],
        summary: &mut RunSummary,
    ) -> (Vec<Article>, bool) {
        let registry = self.registry;
        self.observer.begin(working.len());

        let mut carry = Vec::new();
        let mut current_journal: Option<&str> = None;
        let mut rules: Vec<&Rule> = Vec::new();
        let mut index = 0;
        let mut transients = 0;

        while index < working.len() {
            let article = &working[index];
            let started = Instant::now();

            if current_journal != Some(article.journal.as_str()) {
                rules = registry.rules_for(&article.journal);
                self.log.set_rule_count(&article.journal, rules.len());
                self.observer.journal_started(&article.journal, rules.len());
                current_journal = Some(article.journal.as_str());
            }

            let html = match self.fetcher.fetch(&article.link).await {
                Ok(html) => html,
                Err(error) if error.is_transient() && transients < TRANSIENT_LIMIT => {
                    transients += 1;
                    summary.transient_restarts += 1;
                    warn!(
                        link = %article.link,
                        attempt = transients,
                        "fetch timed out, rebuilding session and resuming"
                    );
                    self.observer.fetch_retry(&article.link);
                    if let Err(session_error) = self.fetcher.reconnect().await {
                        warn!(error = %session_error, "session rebuild failed, abandoning pass");
                        self.observer.pass_aborted(&session_error.to_string());
                        carry.extend_from_slice(&working[index..]);
                        return (carry, true);
                    }
                    self.observer.begin(working.len() - index);
                    current_journal = None;
                    continue;
                }
                Err(error) if error.is_transient() => {
                    warn!(link = %article.link, "article timed out repeatedly, abandoning pass");
                    self.observer.pass_aborted(&error.to_string());
                    carry.extend_from_slice(&working[index..]);
                    return (carry, true);
                }
                Err(error) => {
                    warn!(link = %article.link, error = %error, "fetch failed, abandoning pass");
                    self.observer.pass_aborted(&error.to_string());
                    carry.extend_from_slice(&working[index..]);
                    return (carry, true);
                }
            };
            transients = 0;

            let result = engine::extract(&html, article, &rules);
            if let Err(error) = self.sink.write(&result) {
                warn!(link = %article.link, error = %error, "sink write failed, abandoning pass");
                self.observer.pass_aborted(&error.to_string());
                carry.extend_from_slice(&working[index..]);
                return (carry, true);
            }
            summary.processed += 1;
            self.observer.article_done(&result);

            let should_retry = self.log.record(
                &article.journal,
                result.statement_status,
                result.author_status,
                final_pass,
            );
            if should_retry {
                carry.push(article.clone());
            }
            self.observer.item_done(started.elapsed());
            index += 1;
        }

        (carry, false)
    }
}
