//! Integration tests for DAS Harvester
//!
//! These tests drive the full pipeline from files on disk: rules and the
//! article list load from CSV, a scripted fetcher serves the pages, and the
//! runner fills the output sheet and the analysis report.

use das_harvester::fetch::MockFetcher;
use das_harvester::io::{self, CsvSink, MemorySink};
use das_harvester::models::SearchStatus;
use das_harvester::report::AnalysisLog;
use das_harvester::rules::RuleRegistry;
use das_harvester::runner::Runner;
use das_harvester::ui::NoopObserver;
use std::path::PathBuf;
use tempfile::TempDir;

const RULES_CSV: &str = "\
publisher,journal,title selector,scope tag,identifier,search tag,author selector,secondary selector,author via link
Elsevier,Cognition,h1.title,n/a,Data availability,p,.author,n/a,no
Elsevier,Memory,h1.title,n/a,Data availability,p,.author,n/a,no
";

const ARTICLES_CSV: &str = "\
Cognition,https://example.com/a
https://example.com/b
Memory,https://example.com/c
";

/// Render a journal page the fixture rules can read.
fn page(title: &str, author: &str, statement: &str) -> String {
    format!(
        "<html><body>\
         <h1 class=\"title\">{title}</h1>\
         <span class=\"author\">{author}</span>\
         <div><h3>Data availability</h3><p>{statement}</p></div>\
         </body></html>"
    )
}

/// A page none of the rules match anything on.
fn bare_page(title: &str) -> String {
    format!("<html><body><h1 class=\"title\">{title}</h1></body></html>")
}

/// Write a rules file and an article list into a fresh temp directory.
fn fixture_dir(rules: &str, articles: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let rules_path = dir.path().join("rules.csv");
    let articles_path = dir.path().join("urls.csv");
    std::fs::write(&rules_path, rules).unwrap();
    std::fs::write(&articles_path, articles).unwrap();
    (dir, rules_path, articles_path)
}

/// Test the full pipeline over files: journal inheritance in the article
/// list, two journals, every page resolving on the first pass.
#[tokio::test]
async fn test_full_harvest_from_files() {
    let (_dir, rules_path, articles_path) = fixture_dir(RULES_CSV, ARTICLES_CSV);

    let rules = io::load_rules(&rules_path).unwrap();
    let registry = RuleRegistry::new(rules);
    let articles = io::load_articles(&articles_path).unwrap();
    assert_eq!(articles.len(), 3);
    assert_eq!(articles[1].journal, "cognition");

    let mut fetcher = MockFetcher::new()
        .with_page(
            "https://example.com/a",
            &page("First", "A. Author", "Data at OSF."),
        )
        .with_page(
            "https://example.com/b",
            &page("Second", "B. Author", "Data on request."),
        )
        .with_page(
            "https://example.com/c",
            &page("Third", "C. Author", "Data on Dryad."),
        );
    let mut sink = MemorySink::new();
    let mut observer = NoopObserver;
    let mut log = AnalysisLog::new();

    let summary = Runner::new(&registry, &mut fetcher, &mut sink, &mut observer, &mut log)
        .run(articles)
        .await;

    assert_eq!(summary.passes, 1);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.aborted_passes, 0);
    assert_eq!(summary.transient_restarts, 0);
    assert_eq!(summary.dropped, 0);

    let rows = sink.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].title, "First");
    assert_eq!(rows[0].journal, "cognition");
    assert_eq!(rows[0].statement, "Data at OSF.");
    assert_eq!(rows[0].statement_status, SearchStatus::Found);
    assert_eq!(rows[1].journal, "cognition");
    assert_eq!(rows[2].journal, "memory");
    assert_eq!(rows[2].authors, "C. Author");
    assert!(rows.iter().all(|row| row.notes.is_empty()));

    let cognition = log.report("cognition").unwrap();
    assert_eq!(cognition.searched(), 2);
    assert_eq!(cognition.das_found(), 2);
    assert_eq!(cognition.authors_found(), 2);
    assert_eq!(cognition.rules_matched(), 1);
    assert_eq!(cognition.unresolved(), 0);

    let memory = log.report("memory").unwrap();
    assert_eq!(memory.searched(), 1);
    assert_eq!(memory.das_found(), 1);

    let report = log.generate_log();
    assert!(report.starts_with(&"=".repeat(30)));
    assert!(report.contains("TOTAL DATA COLLECTED :"));
    assert!(report.contains("COGNITION :"));
    assert!(report.contains("MEMORY :"));
    assert!(report.contains("\t3 articles searched."));
    assert!(log.total_report().is_some());
}

/// Test that the output sheet carries one row per processed article, misses
/// included, and reads back through a plain CSV reader.
#[tokio::test]
async fn test_output_sheet_round_trip() {
    let (dir, rules_path, articles_path) = fixture_dir(
        RULES_CSV,
        "Cognition,https://example.com/a\nhttps://example.com/b\n",
    );
    let output_path = dir.path().join("output.csv");

    let registry = RuleRegistry::new(io::load_rules(&rules_path).unwrap());
    let articles = io::load_articles(&articles_path).unwrap();

    let mut fetcher = MockFetcher::new()
        .with_page(
            "https://example.com/a",
            &page("Kept", "A. Author", "Data at OSF."),
        )
        .with_page("https://example.com/b", &bare_page("Dropped"));
    let mut sink = CsvSink::create(&output_path).unwrap();
    let mut observer = NoopObserver;
    let mut log = AnalysisLog::new();

    let summary = Runner::new(&registry, &mut fetcher, &mut sink, &mut observer, &mut log)
        .with_max_passes(1)
        .run(articles)
        .await;
    drop(sink);

    assert_eq!(summary.passes, 1);
    assert_eq!(summary.processed, 2);

    let mut reader = csv::Reader::from_path(&output_path).unwrap();
    let header = reader.headers().unwrap().clone();
    assert_eq!(&header[0], "JOURNAL");
    assert_eq!(&header[1], "ARTICLE");
    assert_eq!(&header[4], "DATA AVAILABILITY STATEMENT");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "Kept");
    assert_eq!(&rows[0][4], "Data at OSF.");
    assert_eq!(&rows[0][5], "");

    // The miss still gets a row: empty statement, notes naming what failed
    assert_eq!(&rows[1][1], "Dropped");
    assert_eq!(&rows[1][4], "");
    assert!(!rows[1][5].is_empty());

    let report = log.report("cognition").unwrap();
    assert_eq!(report.das_found(), 1);
    assert_eq!(report.unresolved(), 1);
}

/// Test that an article yielding nothing on the first pass is re-fetched on
/// the second and resolves there.
#[tokio::test]
async fn test_retry_pass_recovers_article() {
    let (_dir, rules_path, articles_path) =
        fixture_dir(RULES_CSV, "Cognition,https://example.com/a\n");

    let registry = RuleRegistry::new(io::load_rules(&rules_path).unwrap());
    let articles = io::load_articles(&articles_path).unwrap();

    let mut fetcher = MockFetcher::new()
        .with_page("https://example.com/a", &bare_page("Slow To Load"))
        .with_page(
            "https://example.com/a",
            &page("Slow To Load", "A. Author", "Data at OSF."),
        );
    let mut sink = MemorySink::new();
    let mut observer = NoopObserver;
    let mut log = AnalysisLog::new();

    let summary = Runner::new(&registry, &mut fetcher, &mut sink, &mut observer, &mut log)
        .run(articles)
        .await;

    assert_eq!(summary.passes, 2);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.dropped, 0);
    assert_eq!(fetcher.fetch_count("https://example.com/a"), 2);

    let rows = sink.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].statement_status, SearchStatus::NotFound);
    assert_eq!(rows[1].statement_status, SearchStatus::Found);

    let report = log.report("cognition").unwrap();
    assert_eq!(report.searched(), 2);
    assert_eq!(report.das_found(), 1);
    assert_eq!(report.unresolved(), 0);
}

/// Test that a `$publisher-standard` pointer row loaded from the rules file
/// resolves to the publisher's concrete rules.
#[tokio::test]
async fn test_pointer_rules_resolve_from_file() {
    let rules_csv = "\
publisher,journal,title selector,scope tag,identifier,search tag,author selector,secondary selector,author via link
Wiley,Ecology Letters,h1.title,n/a,Data availability,p,.author,n/a,no
Wiley,Biotropica,h1.title,n/a,$publisher-standard,p,.author,n/a,no
";
    let (_dir, rules_path, articles_path) =
        fixture_dir(rules_csv, "Biotropica,https://example.com/bio\n");

    let registry = RuleRegistry::new(io::load_rules(&rules_path).unwrap());
    assert_eq!(registry.rules_for("biotropica").len(), 1);
    assert_eq!(registry.rules_for("biotropica")[0].journal, "ecology letters");

    let articles = io::load_articles(&articles_path).unwrap();
    let mut fetcher = MockFetcher::new().with_page(
        "https://example.com/bio",
        &page("Canopy Study", "B. Author", "Data on Dryad."),
    );
    let mut sink = MemorySink::new();
    let mut observer = NoopObserver;
    let mut log = AnalysisLog::new();

    Runner::new(&registry, &mut fetcher, &mut sink, &mut observer, &mut log)
        .run(articles)
        .await;

    let report = log.report("biotropica").unwrap();
    assert_eq!(report.rules_matched(), 1);
    assert_eq!(report.das_found(), 1);
    assert_eq!(sink.rows()[0].statement, "Data on Dryad.");
}

/// Test that an article whose journal has no rules still produces a row and
/// is counted as unresolved, not silently skipped.
#[tokio::test]
async fn test_unknown_journal_article_still_writes_row() {
    let (_dir, rules_path, articles_path) =
        fixture_dir(RULES_CSV, "Unknown Quarterly,https://example.com/u\n");

    let registry = RuleRegistry::new(io::load_rules(&rules_path).unwrap());
    let articles = io::load_articles(&articles_path).unwrap();

    let mut fetcher = MockFetcher::new().with_page(
        "https://example.com/u",
        &page("Anything", "A. Author", "Data at OSF."),
    );
    let mut sink = MemorySink::new();
    let mut observer = NoopObserver;
    let mut log = AnalysisLog::new();

    let summary = Runner::new(&registry, &mut fetcher, &mut sink, &mut observer, &mut log)
        .with_max_passes(1)
        .run(articles)
        .await;

    assert_eq!(summary.processed, 1);
    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].notes.contains("no rules configured"));

    let report = log.report("unknown quarterly").unwrap();
    assert_eq!(report.rules_matched(), 0);
    assert_eq!(report.searched(), 1);
    assert_eq!(report.unresolved(), 1);
}
