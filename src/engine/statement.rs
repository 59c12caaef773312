//! Locating the data availability statement near its heading.

use scraper::{ElementRef, Html};

use crate::models::{Rule, SearchStatus};

/// Result of running the statement scan over one document.
#[derive(Debug, Clone)]
pub(crate) struct StatementScan {
    pub status: SearchStatus,
    pub text: String,
    pub notes: Vec<String>,
}

/// What a single rule produced for this document.
enum RuleOutcome {
    /// No heading matched the identifier.
    NoMatch,
    /// Exactly one heading matched and a statement was located.
    Statement(String),
    /// More than one heading matched; count recorded for the note.
    Ambiguous(usize),
}

/// Run each rule in order, stopping at the first extracted statement.
///
/// Ambiguity and evaluation failures overwrite the running status but never
/// stop the scan; a rule that simply matches nothing leaves it untouched.
pub(crate) fn scan(document: &Html, rules: &[&Rule]) -> StatementScan {
    let mut status = SearchStatus::NotFound;
    let mut notes = Vec::new();

    for rule in rules {
        match evaluate(document, rule) {
            Ok(RuleOutcome::Statement(text)) => {
                return StatementScan {
                    status: SearchStatus::Found,
                    text,
                    notes,
                };
            }
            Ok(RuleOutcome::Ambiguous(count)) => {
                status = SearchStatus::Ambiguous;
                notes.push(format!("{} headings match '{}'", count, rule.identifier));
            }
            Ok(RuleOutcome::NoMatch) => {}
            Err(reason) => {
                status = SearchStatus::Failed;
                notes.push(reason);
            }
        }
    }

    StatementScan {
        status,
        text: String::new(),
        notes,
    }
}

fn evaluate(document: &Html, rule: &Rule) -> Result<RuleOutcome, String> {
    let headers = find_headings(document, rule);
    match headers.len() {
        0 => Ok(RuleOutcome::NoMatch),
        1 => match locate_statement(headers[0], &rule.search_tag) {
            Some(text) => Ok(RuleOutcome::Statement(text)),
            None => Err(format!(
                "no statement found near heading '{}'",
                rule.identifier
            )),
        },
        n => Ok(RuleOutcome::Ambiguous(n)),
    }
}

/// Collect the elements whose full text equals the identifier, restricted to
/// the rule's scope tag when one is set, keeping only outermost matches.
///
/// A heading wrapped in single-child containers (`div > h3 > span`, all
/// with the same text) would otherwise count once per level and misreport a
/// unique heading as ambiguous. The outermost element of such a chain is
/// also the one whose siblings hold the statement body.
fn find_headings<'a>(document: &'a Html, rule: &Rule) -> Vec<ElementRef<'a>> {
    let candidates: Vec<ElementRef<'a>> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| match &rule.scope_tag {
            Some(tag) => el.value().name() == tag.as_str(),
            None => true,
        })
        .filter(|el| el.text().collect::<String>() == rule.identifier)
        .collect();

    candidates
        .iter()
        .copied()
        .filter(|el| {
            !el.ancestors()
                .any(|anc| candidates.iter().any(|c| c.id() == anc.id()))
        })
        .collect()
}

/// Hunt for the statement body around a uniquely identified heading.
///
/// Three strategies, first hit wins: a following sibling with the search
/// tag, then any descendant of the heading's parent with the search tag,
/// then the nearest enclosing element whose text extends beyond the
/// heading's own.
fn locate_statement(header: ElementRef<'_>, search_tag: &str) -> Option<String> {
    following_sibling(header, search_tag)
        .or_else(|| parent_descendant(header, search_tag))
        .or_else(|| enclosing_text(header))
}

fn following_sibling(header: ElementRef<'_>, search_tag: &str) -> Option<String> {
    header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == search_tag)
        .map(|el| el.text().collect())
}

fn parent_descendant(header: ElementRef<'_>, search_tag: &str) -> Option<String> {
    let parent = header.parent().and_then(ElementRef::wrap)?;
    parent
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.id() != parent.id())
        .find(|el| el.value().name() == search_tag)
        .map(|el| el.text().collect())
}

fn enclosing_text(header: ElementRef<'_>) -> Option<String> {
    let header_text: String = header.text().collect();
    for ancestor in header.ancestors() {
        let Some(el) = ElementRef::wrap(ancestor) else {
            // Reached the document node without finding more text
            return None;
        };
        let text: String = el.text().collect();
        if text != header_text {
            return Some(text);
        }
    }
    None
}
