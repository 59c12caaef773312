//! Per-journal counters, the retry decision, and the run report.

use std::collections::HashMap;

use crate::models::SearchStatus;

const BORDER_WIDTH: usize = 30;

/// Counters for one journal, accumulated across every pass.
#[derive(Debug, Clone)]
pub struct JournalReport {
    name: String,
    rules_matched: usize,
    searched: usize,
    das_found: usize,
    authors_found: usize,
    ambiguous: usize,
    unresolved: usize,
}

impl JournalReport {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules_matched: 0,
            searched: 0,
            das_found: 0,
            authors_found: 0,
            ambiguous: 0,
            unresolved: 0,
        }
    }

    /// Journal name as first seen.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documents put through the engine, retried attempts included.
    pub fn searched(&self) -> usize {
        self.searched
    }

    /// Documents with a statement extracted.
    pub fn das_found(&self) -> usize {
        self.das_found
    }

    /// Documents with an author list extracted.
    pub fn authors_found(&self) -> usize {
        self.authors_found
    }

    /// Documents with more than one statement heading.
    pub fn ambiguous(&self) -> usize {
        self.ambiguous
    }

    /// Documents that yielded nothing after the final pass.
    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    /// Rules resolved for this journal.
    pub fn rules_matched(&self) -> usize {
        self.rules_matched
    }

    /// Classify one processed document and decide whether it should be
    /// retried on the next pass.
    ///
    /// A document that produced neither a statement nor authors retries
    /// until the final pass, where it counts as unresolved instead. Any
    /// extracted data resolves the document for good; an ambiguous
    /// statement also resolves it, since re-fetching cannot shrink the
    /// match count.
    fn record(&mut self, das: SearchStatus, authors: SearchStatus, final_pass: bool) -> bool {
        self.searched += 1;
        if das.is_miss() && authors.is_miss() {
            if final_pass {
                self.unresolved += 1;
                return false;
            }
            return true;
        }
        match das {
            SearchStatus::Found => self.das_found += 1,
            SearchStatus::Ambiguous => self.ambiguous += 1,
            _ => {}
        }
        if authors == SearchStatus::Found {
            self.authors_found += 1;
        }
        false
    }

    fn render(&self) -> String {
        format!(
            "{} :\n\n\
             \t{} articles searched.\n\
             \t{} data availability statement(s) found.\n\
             \t{} author(s) found.\n\n\
             \t{} article(s) contained multiple data availability statements.\n\
             \t{} article(s) contained no readable data.",
            self.name.to_uppercase(),
            self.searched,
            self.das_found,
            self.authors_found,
            self.ambiguous,
            self.unresolved
        )
    }
}

/// All journal reports for a run, in first-seen order, plus the derived
/// grand total.
#[derive(Debug, Clone, Default)]
pub struct AnalysisLog {
    reports: Vec<JournalReport>,
    index: HashMap<String, usize>,
    total: Option<JournalReport>,
}

impl AnalysisLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn report_mut(&mut self, journal: &str) -> &mut JournalReport {
        let position = *self.index.entry(journal.to_string()).or_insert_with(|| {
            self.reports.push(JournalReport::new(journal));
            self.reports.len() - 1
        });
        &mut self.reports[position]
    }

    /// Record one processed document under its journal; returns whether the
    /// document should go into the next pass's working set.
    pub fn record(
        &mut self,
        journal: &str,
        das: SearchStatus,
        authors: SearchStatus,
        final_pass: bool,
    ) -> bool {
        self.report_mut(journal).record(das, authors, final_pass)
    }

    /// Record how many rules resolved for a journal. Idempotent: a journal
    /// revisited on a retry pass re-resolves the same set and must not
    /// inflate the count.
    pub fn set_rule_count(&mut self, journal: &str, count: usize) {
        self.report_mut(journal).rules_matched = count;
    }

    /// Count a document the final pass never reached. Does not touch the
    /// searched counter: the document was not put through the engine.
    pub fn mark_unresolved(&mut self, journal: &str) {
        self.report_mut(journal).unresolved += 1;
    }

    /// Look up one journal's counters.
    pub fn report(&self, journal: &str) -> Option<&JournalReport> {
        self.index.get(journal).map(|&i| &self.reports[i])
    }

    /// All journal reports in first-seen order.
    pub fn reports(&self) -> impl Iterator<Item = &JournalReport> {
        self.reports.iter()
    }

    /// Render the full report: the grand-total block first, then one block
    /// per journal in first-seen order.
    ///
    /// The total is summed from the per-journal counters at call time, so
    /// repeated calls render the same text.
    pub fn generate_log(&mut self) -> String {
        let mut total = JournalReport::new("Total Data Collected");
        let mut body = String::new();
        for report in &self.reports {
            body.push_str(&report.render());
            body.push_str("\n\n");
            total.rules_matched += report.rules_matched;
            total.searched += report.searched;
            total.das_found += report.das_found;
            total.authors_found += report.authors_found;
            total.ambiguous += report.ambiguous;
            total.unresolved += report.unresolved;
        }

        let border = format!("{}\n\n\n", "=".repeat(BORDER_WIDTH));
        let log = format!("{}{}\n\n\n{}{}", border, total.render(), border, body);
        self.total = Some(total);
        log
    }

    /// The grand-total block on its own, available once `generate_log` has
    /// run.
    pub fn total_report(&self) -> Option<String> {
        self.total.as_ref().map(|total| {
            let border = format!("\n\n\n{}\n\n\n", "=".repeat(BORDER_WIDTH));
            format!("{}{}{}", border, total.render(), border)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_before_final_pass_retries() {
        let mut log = AnalysisLog::new();
        let retry = log.record(
            "cognition",
            SearchStatus::NotFound,
            SearchStatus::Failed,
            false,
        );
        assert!(retry);

        let report = log.report("cognition").unwrap();
        assert_eq!(report.searched(), 1);
        assert_eq!(report.das_found(), 0);
        assert_eq!(report.unresolved(), 0);
    }

    #[test]
    fn test_miss_on_final_pass_is_unresolved() {
        let mut log = AnalysisLog::new();
        let retry = log.record(
            "cognition",
            SearchStatus::NotFound,
            SearchStatus::NotFound,
            true,
        );
        assert!(!retry);
        assert_eq!(log.report("cognition").unwrap().unresolved(), 1);
    }

    #[test]
    fn test_any_data_resolves_the_document() {
        let mut log = AnalysisLog::new();
        assert!(!log.record("a", SearchStatus::Found, SearchStatus::NotFound, false));
        assert!(!log.record("a", SearchStatus::NotFound, SearchStatus::Found, false));

        let report = log.report("a").unwrap();
        assert_eq!(report.searched(), 2);
        assert_eq!(report.das_found(), 1);
        assert_eq!(report.authors_found(), 1);
    }

    #[test]
    fn test_ambiguous_counts_and_never_retries() {
        let mut log = AnalysisLog::new();
        let retry = log.record(
            "cognition",
            SearchStatus::Ambiguous,
            SearchStatus::NotFound,
            false,
        );
        assert!(!retry);

        let report = log.report("cognition").unwrap();
        assert_eq!(report.ambiguous(), 1);
        assert_eq!(report.das_found(), 0);
    }

    #[test]
    fn test_searched_counts_every_attempt() {
        let mut log = AnalysisLog::new();
        log.record("a", SearchStatus::NotFound, SearchStatus::NotFound, false);
        log.record("a", SearchStatus::NotFound, SearchStatus::NotFound, false);
        log.record("a", SearchStatus::Found, SearchStatus::Found, false);
        assert_eq!(log.report("a").unwrap().searched(), 3);
    }

    #[test]
    fn test_rule_count_is_set_not_accumulated() {
        let mut log = AnalysisLog::new();
        log.set_rule_count("a", 3);
        log.set_rule_count("a", 3);
        assert_eq!(log.report("a").unwrap().rules_matched(), 3);
    }

    #[test]
    fn test_mark_unresolved_skips_searched() {
        let mut log = AnalysisLog::new();
        log.mark_unresolved("a");
        let report = log.report("a").unwrap();
        assert_eq!(report.unresolved(), 1);
        assert_eq!(report.searched(), 0);
    }

    #[test]
    fn test_total_sums_per_journal_counters() {
        let mut log = AnalysisLog::new();
        log.record("a", SearchStatus::Found, SearchStatus::Found, false);
        log.record("a", SearchStatus::Ambiguous, SearchStatus::NotFound, false);
        log.record("b", SearchStatus::Found, SearchStatus::NotFound, false);
        log.record("b", SearchStatus::NotFound, SearchStatus::NotFound, true);

        let text = log.generate_log();
        // Total block: 4 searched, 2 statements, 1 authors, 1 ambiguous,
        // 1 unresolved
        assert!(text.starts_with(&format!("{}\n\n\n", "=".repeat(30))));
        assert!(text.contains("TOTAL DATA COLLECTED :"));
        assert!(text.contains("\t4 articles searched."));
        assert!(text.contains("\t2 data availability statement(s) found."));
        assert!(text.contains("\t1 author(s) found."));
        assert!(text.contains("A :"));
        assert!(text.contains("B :"));
    }

    #[test]
    fn test_generate_log_is_idempotent() {
        let mut log = AnalysisLog::new();
        log.record("a", SearchStatus::Found, SearchStatus::Found, false);
        let first = log.generate_log();
        let second = log.generate_log();
        assert_eq!(first, second);
    }

    #[test]
    fn test_total_report_requires_generation() {
        let mut log = AnalysisLog::new();
        log.record("a", SearchStatus::Found, SearchStatus::Found, false);
        assert!(log.total_report().is_none());

        log.generate_log();
        let total = log.total_report().unwrap();
        assert!(total.contains("TOTAL DATA COLLECTED :"));
        assert!(total.contains("\t1 articles searched."));
    }

    #[test]
    fn test_journals_render_in_first_seen_order() {
        let mut log = AnalysisLog::new();
        log.record("zebrafish", SearchStatus::Found, SearchStatus::Found, false);
        log.record("aardvark studies", SearchStatus::Found, SearchStatus::Found, false);

        let text = log.generate_log();
        let zebrafish = text.find("ZEBRAFISH :").unwrap();
        let aardvark = text.find("AARDVARK STUDIES :").unwrap();
        assert!(zebrafish < aardvark);
    }
}
