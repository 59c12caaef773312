//! Rule-driven extraction over one fetched document.
//!
//! The engine is deliberately infallible: anything that goes wrong while
//! evaluating a rule becomes a status and a note on the result, never an
//! error. The page is parsed here, synchronously, so the non-Send DOM never
//! crosses an await point in the callers.

mod authors;
mod statement;

use scraper::{Html, Selector};
use tracing::debug;

use crate::models::{Article, ExtractionResult, Rule};

/// Run the statement scan, the author scan, and title resolution over one
/// page, producing the row-ready result for this article.
pub fn extract(html: &str, article: &Article, rules: &[&Rule]) -> ExtractionResult {
    let document = Html::parse_document(html);
    let mut notes: Vec<String> = Vec::new();

    if rules.is_empty() {
        notes.push(format!(
            "no rules configured for journal '{}'",
            article.journal
        ));
    }

    let statement = statement::scan(&document, rules);
    let author = authors::scan(&document, rules);
    let (title, title_note) = resolve_title(&document, rules);

    notes.extend(statement.notes);
    notes.extend(author.notes);
    notes.extend(title_note);

    debug!(
        link = %article.link,
        statement = %statement.status,
        authors = %author.status,
        "extracted"
    );

    ExtractionResult {
        journal: article.journal.clone(),
        title,
        authors: author.names,
        link: article.link.clone(),
        statement: statement.text,
        notes: notes.join("; "),
        statement_status: statement.status,
        author_status: author.status,
    }
}

/// Resolve the article title from the first rule's title selector.
///
/// Every rule in a journal's set describes the same layout family, so the
/// first is as authoritative as any and the choice stays stable across
/// retry passes. A missing title only annotates the result.
fn resolve_title(document: &Html, rules: &[&Rule]) -> (String, Option<String>) {
    let Some(first) = rules.first() else {
        return (String::new(), None);
    };
    let Ok(selector) = Selector::parse(&first.title_selector) else {
        return (
            String::new(),
            Some(format!(
                "invalid title selector '{}'",
                first.title_selector
            )),
        );
    };
    match document.select(&selector).next() {
        Some(el) => (el.text().collect(), None),
        None => (
            String::new(),
            Some(format!("no title matched '{}'", first.title_selector)),
        ),
    }
}
