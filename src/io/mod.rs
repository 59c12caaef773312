//! CSV persistence: rule and article loaders, and the output sheet sink.
//!
//! Both input files are hand-maintained, so the loaders validate loudly and
//! name the offending line instead of guessing. The output sheet is flushed
//! after every row; an aborted pass must not lose rows already earned.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::{normalize_key, Article, ExtractionResult, Rule};

/// Header row of the output sheet.
const OUTPUT_HEADER: [&str; 6] = [
    "JOURNAL",
    "ARTICLE",
    "AUTHOR(S)",
    "LINK",
    "DATA AVAILABILITY STATEMENT",
    "NOTES",
];

/// Column count of a rule row.
const RULE_COLUMNS: usize = 9;

/// Errors raised while reading input files or writing the output sheet.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    /// The underlying file could not be read or written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV the parser itself rejected
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A structurally valid row with invalid content
    #[error("{path}:{line}: {message}")]
    Row {
        path: String,
        line: u64,
        message: String,
    },
}

fn row_error(path: &Path, line: u64, message: impl Into<String>) -> CsvError {
    CsvError::Row {
        path: path.display().to_string(),
        line,
        message: message.into(),
    }
}

/// Loads matching rules from a CSV file.
///
/// The first row is a header and is skipped. Every other row carries nine
/// columns: publisher, journal, title selector, scope tag, identifier,
/// search tag, author selector, secondary author selector, and the
/// author-via-link flag. Key columns are normalized to lowercase; `n/a`
/// marks an optional column as absent.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, CsvError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rules = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != RULE_COLUMNS {
            return Err(row_error(
                path,
                line,
                format!("expected {} columns, found {}", RULE_COLUMNS, record.len()),
            ));
        }

        let author_via_link = match normalize_key(&record[8]).as_str() {
            "yes" => true,
            "no" => false,
            other => {
                return Err(row_error(
                    path,
                    line,
                    format!("column 9 must be yes or no, found '{}'", other),
                ));
            }
        };

        rules.push(Rule {
            publisher: normalize_key(&record[0]),
            journal: normalize_key(&record[1]),
            title_selector: record[2].trim().to_string(),
            scope_tag: optional_tag(&record[3]),
            identifier: record[4].trim().to_string(),
            search_tag: normalize_key(&record[5]),
            author_selector: record[6].trim().to_string(),
            author_secondary: optional_selector(&record[7]),
            author_via_link,
        });
    }

    info!(count = rules.len(), path = %path.display(), "loaded rules");
    Ok(rules)
}

/// Loads the article list from a CSV file.
///
/// There is no header row. Each row is either `journal,link` or a bare
/// `link`; a row whose journal column is missing or empty inherits the
/// journal of the nearest row above that named one. The first row must
/// name a journal.
pub fn load_articles(path: impl AsRef<Path>) -> Result<Vec<Article>, CsvError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut articles = Vec::new();
    let mut journal: Option<String> = None;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let link = if record.len() > 1 {
            let name = normalize_key(&record[0]);
            if !name.is_empty() {
                journal = Some(name);
            }
            record[1].trim()
        } else {
            record[0].trim()
        };

        let journal = journal.as_deref().ok_or_else(|| {
            row_error(path, line, "row has no journal and no earlier row names one")
        })?;
        if link.is_empty() {
            return Err(row_error(path, line, "row has an empty link"));
        }
        articles.push(Article::new(journal, link));
    }

    info!(count = articles.len(), path = %path.display(), "loaded articles");
    Ok(articles)
}

/// Destination for completed extraction rows.
pub trait RecordSink: Send + std::fmt::Debug {
    /// Appends one row. Implementations persist eagerly so rows already
    /// written survive an aborted pass.
    fn write(&mut self, result: &ExtractionResult) -> Result<(), CsvError>;
}

/// Sink writing the output sheet to a CSV file.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Creates the output file, truncating any previous run, and writes the
    /// header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CsvError> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(OUTPUT_HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    /// Path the sheet is being written to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, result: &ExtractionResult) -> Result<(), CsvError> {
        self.writer.write_record([
            result.journal.as_str(),
            result.title.as_str(),
            result.authors.as_str(),
            result.link.as_str(),
            result.statement.as_str(),
            result.notes.as_str(),
        ])?;
        self.writer.flush()?;
        debug!(link = %result.link, "row written");
        Ok(())
    }
}

/// Sink keeping rows in memory instead of a file.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Vec<ExtractionResult>,
    write_limit: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write past the first `n` fail.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.write_limit = Some(n);
        self
    }

    /// Rows written so far.
    pub fn rows(&self) -> &[ExtractionResult] {
        &self.rows
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, result: &ExtractionResult) -> Result<(), CsvError> {
        if let Some(limit) = self.write_limit {
            if self.rows.len() >= limit {
                return Err(CsvError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "write limit reached",
                )));
            }
        }
        self.rows.push(result.clone());
        Ok(())
    }
}

/// `n/a` or empty marks an absent tag column; anything else is a tag name.
fn optional_tag(field: &str) -> Option<String> {
    let tag = normalize_key(field);
    (!tag.is_empty() && tag != "n/a").then_some(tag)
}

/// Same as [`optional_tag`] but preserves case, for CSS selectors.
fn optional_selector(field: &str) -> Option<String> {
    let selector = field.trim();
    (!selector.is_empty() && !selector.eq_ignore_ascii_case("n/a"))
        .then(|| selector.to_string())
}
