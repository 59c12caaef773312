//! Extracting and deduplicating the author list.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::models::{Rule, SearchStatus};

/// Result of running the author scan over one document.
#[derive(Debug, Clone)]
pub(crate) struct AuthorScan {
    pub status: SearchStatus,
    pub names: String,
    pub notes: Vec<String>,
}

/// Run each rule in order, stopping at the first non-empty author string.
pub(crate) fn scan(document: &Html, rules: &[&Rule]) -> AuthorScan {
    let mut status = SearchStatus::NotFound;
    let mut notes = Vec::new();

    for rule in rules {
        match evaluate(document, rule) {
            Ok(names) => {
                let joined = dedup_join(names);
                if !joined.is_empty() {
                    return AuthorScan {
                        status: SearchStatus::Found,
                        names: joined,
                        notes,
                    };
                }
            }
            Err(reason) => {
                status = SearchStatus::Failed;
                notes.push(reason);
            }
        }
    }

    AuthorScan {
        status,
        names: String::new(),
        notes,
    }
}

/// Collect the display names a single rule yields for this document, in
/// document order, duplicates included.
fn evaluate(document: &Html, rule: &Rule) -> Result<Vec<String>, String> {
    let primary = Selector::parse(&rule.author_selector)
        .map_err(|_| format!("invalid author selector '{}'", rule.author_selector))?;
    let elements: Vec<ElementRef> = document.select(&primary).collect();

    // A secondary selector pairs surnames with the primary matches by
    // position; it takes precedence over link resolution.
    if let Some(secondary) = &rule.author_secondary {
        let surname_sel = Selector::parse(secondary)
            .map_err(|_| format!("invalid surname selector '{}'", secondary))?;
        let surnames: Vec<ElementRef> = document.select(&surname_sel).collect();
        if surnames.len() < elements.len() {
            return Err(format!(
                "surname selector '{}' matched {} of {} author elements",
                secondary,
                surnames.len(),
                elements.len()
            ));
        }
        return Ok(elements
            .iter()
            .zip(&surnames)
            .map(|(given, surname)| {
                format!(
                    "{} {}",
                    given.text().collect::<String>(),
                    surname.text().collect::<String>()
                )
            })
            .collect());
    }

    elements.iter().map(|el| display_name(*el, rule)).collect()
}

fn display_name(el: ElementRef<'_>, rule: &Rule) -> Result<String, String> {
    if rule.author_via_link {
        // Direct children only: a link nested deeper belongs to something
        // else (an affiliation popup, an ORCID badge).
        let link = el
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "a")
            .ok_or_else(|| {
                format!(
                    "author element matched by '{}' has no child link",
                    rule.author_selector
                )
            })?;
        Ok(link.text().collect())
    } else {
        Ok(el.text().collect())
    }
}

/// Keep each distinct name once, in first-seen order, and join for display.
fn dedup_join(names: Vec<String>) -> String {
    let mut seen = HashSet::new();
    let unique: Vec<String> = names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect();
    unique.join(", ")
}
