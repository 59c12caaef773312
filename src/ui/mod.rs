//! Console surface for live harvest progress.
//!
//! The runner reports through the [`ProgressObserver`] trait and never
//! blocks on drawing; [`ConsoleUi`] renders status lines and a progress bar
//! with a remaining-time estimate, [`NoopObserver`] swallows everything for
//! quiet runs and tests.

use std::collections::VecDeque;
use std::io::IsTerminal;
use std::time::Duration;

use owo_colors::OwoColorize;

use crate::models::{ExtractionResult, SearchStatus};

/// Per-item durations kept for the remaining-time estimate.
const SAMPLE_WINDOW: usize = 30;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Welcome banner printed at the start of a harvest run.
pub fn print_banner() {
    let title = format!("DAS Harvester v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("╔{}╗", "═".repeat(40));
    println!("║{:^40}║", title);
    println!("║{:^40}║", "data availability statement harvester");
    println!("╚{}╝", "═".repeat(40));
    println!();
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Events the runner emits while working through a pass.
///
/// Every method has an empty default body so observers implement only what
/// they render. Calls arrive from the worker; implementations must return
/// quickly and never fail.
pub trait ProgressObserver: Send {
    /// A pass (or a resumed pass) is about to process `total` articles.
    fn begin(&mut self, total: usize) {
        let _ = total;
    }

    /// One article finished, taking `elapsed` wall time.
    fn item_done(&mut self, elapsed: Duration) {
        let _ = elapsed;
    }

    /// A top-level pass is starting. `pass` is zero-based.
    fn pass_started(&mut self, pass: usize, max_passes: usize, pending: usize) {
        let _ = (pass, max_passes, pending);
    }

    /// The working set moved to a new journal.
    fn journal_started(&mut self, journal: &str, rule_count: usize) {
        let _ = (journal, rule_count);
    }

    /// An article was extracted and its row recorded.
    fn article_done(&mut self, result: &ExtractionResult) {
        let _ = result;
    }

    /// A fetch timed out; the session is being rebuilt and the pass resumes.
    fn fetch_retry(&mut self, link: &str) {
        let _ = link;
    }

    /// The pass stopped early; progress is kept and the rest carries over.
    fn pass_aborted(&mut self, reason: &str) {
        let _ = reason;
    }

    /// The whole run is complete.
    fn finished(&mut self) {}
}

/// Observer that renders nothing.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Terminal renderer: one status line per article above a progress bar.
pub struct ConsoleUi {
    bar: Option<indicatif::ProgressBar>,
    times: VecDeque<Duration>,
    tty: bool,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self {
            bar: None,
            times: VecDeque::new(),
            tty: is_terminal(),
        }
    }

    /// Print a line without tearing the progress bar.
    fn line(&self, text: &str) {
        match &self.bar {
            Some(bar) => bar.println(text),
            None => println!("{}", text),
        }
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleUi {
    fn begin(&mut self, total: usize) {
        if let Some(old) = self.bar.take() {
            old.finish_and_clear();
        }
        if !self.tty {
            return;
        }
        let bar = indicatif::ProgressBar::new(total as u64);
        bar.set_style(
            indicatif::ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos} of {len} article(s) searched ({msg})",
            )
            .unwrap()
            .progress_chars("█▓▒░ "),
        );
        bar.set_message(eta_label(&self.times, total as u64));
        self.bar = Some(bar);
    }

    fn item_done(&mut self, elapsed: Duration) {
        self.times.push_back(elapsed);
        if self.times.len() > SAMPLE_WINDOW {
            self.times.pop_front();
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
            let remaining = bar.length().unwrap_or(0).saturating_sub(bar.position());
            bar.set_message(eta_label(&self.times, remaining));
        }
    }

    fn pass_started(&mut self, pass: usize, max_passes: usize, pending: usize) {
        if pass == 0 {
            return;
        }
        let border = "═".repeat(30);
        self.line(&format!("\n\n{}", border.dimmed()));
        self.line(
            &format!("RETRYING {} FAILED ARTICLE(S).", pending)
                .yellow()
                .bold()
                .to_string(),
        );
        self.line(&format!("Pass {} (max {})", pass + 1, max_passes));
        self.line(&format!("{}\n", border.dimmed()));
    }

    fn journal_started(&mut self, journal: &str, rule_count: usize) {
        self.line(&format!("\n{}", "─".repeat(30).dimmed()));
        self.line(&format!("JOURNAL: {}", journal.cyan().bold()));
        self.line(&format!(">>  found {} rule(s)\n", rule_count));
    }

    fn article_done(&mut self, result: &ExtractionResult) {
        let codes = format!(
            "{}{}",
            paint_code(result.statement_status),
            paint_code(result.author_status)
        );
        let annotation = annotation(result);
        let overhead = 8 + annotation.map(|a| a.len() + 1).unwrap_or(0);
        let link = truncate_with_ellipsis(
            &result.link,
            terminal_width().saturating_sub(overhead),
        );
        let line = match annotation {
            Some(text) if result.statement_status == SearchStatus::Ambiguous => {
                format!("{} {} {}", codes, link, text.yellow())
            }
            Some(text) => format!("{} {} {}", codes, link, text.red()),
            None => format!("{} {}", codes, link),
        };
        self.line(&line);
    }

    fn fetch_retry(&mut self, link: &str) {
        self.line(
            &format!("webpage timed out, rebuilding session and resuming: {}", link)
                .yellow()
                .to_string(),
        );
    }

    fn pass_aborted(&mut self, reason: &str) {
        self.line(
            &format!("pass aborted: {} (progress kept, remainder retried)", reason)
                .red()
                .bold()
                .to_string(),
        );
    }

    fn finished(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// One colored `[x]` status cell.
fn paint_code(status: SearchStatus) -> String {
    let code = format!("[{}]", status.code());
    match status {
        SearchStatus::Found => code.green().to_string(),
        SearchStatus::NotFound => code.dimmed().to_string(),
        SearchStatus::Ambiguous => code.yellow().bold().to_string(),
        SearchStatus::Failed => code.red().bold().to_string(),
    }
}

/// Trailing note for outcomes that need the operator's eye.
fn annotation(result: &ExtractionResult) -> Option<&'static str> {
    if result.statement_status == SearchStatus::Ambiguous {
        Some("(AMBIGUOUS IDENTIFIER(S) FOUND [SEE OUTPUT FILE])")
    } else if result.statement_status == SearchStatus::Failed
        || result.author_status == SearchStatus::Failed
    {
        Some("(ERROR RETRIEVING DATA)")
    } else {
        None
    }
}

/// Remaining-time estimate from the mean of the recent samples.
fn eta_label(samples: &VecDeque<Duration>, remaining: u64) -> String {
    if samples.is_empty() {
        return "calculating...".to_string();
    }
    let mean = samples.iter().map(Duration::as_secs_f64).sum::<f64>() / samples.len() as f64;
    let left = (mean * remaining as f64).round() as u64;
    format!("{}h {}m remaining", left / 3600, left / 60 % 60)
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 || max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();

    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;

    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width.saturating_sub(3) {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(statement: SearchStatus, author: SearchStatus) -> ExtractionResult {
        ExtractionResult {
            journal: "cognition".to_string(),
            title: String::new(),
            authors: String::new(),
            link: "https://example.com/a".to_string(),
            statement: String::new(),
            notes: String::new(),
            statement_status: statement,
            author_status: author,
        }
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hi", 10), "Hi");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
    }

    #[test]
    fn test_eta_label() {
        let mut samples = VecDeque::new();
        assert_eq!(eta_label(&samples, 100), "calculating...");

        samples.push_back(Duration::from_secs(2));
        assert_eq!(eta_label(&samples, 30), "0h 1m remaining");

        samples.clear();
        samples.push_back(Duration::from_secs(90));
        assert_eq!(eta_label(&samples, 80), "2h 0m remaining");
    }

    #[test]
    fn test_sample_window_is_bounded() {
        let mut ui = ConsoleUi::new();
        for _ in 0..40 {
            ui.item_done(Duration::from_secs(1));
        }
        assert_eq!(ui.times.len(), SAMPLE_WINDOW);
    }

    #[test]
    fn test_annotation_priority() {
        assert_eq!(annotation(&result(SearchStatus::Found, SearchStatus::Found)), None);
        assert_eq!(
            annotation(&result(SearchStatus::Ambiguous, SearchStatus::Failed)),
            Some("(AMBIGUOUS IDENTIFIER(S) FOUND [SEE OUTPUT FILE])")
        );
        assert_eq!(
            annotation(&result(SearchStatus::NotFound, SearchStatus::Failed)),
            Some("(ERROR RETRIEVING DATA)")
        );
        assert_eq!(
            annotation(&result(SearchStatus::Failed, SearchStatus::Found)),
            Some("(ERROR RETRIEVING DATA)")
        );
    }

    #[test]
    fn test_status_cells_carry_codes() {
        assert!(paint_code(SearchStatus::Found).contains("[+]"));
        assert!(paint_code(SearchStatus::NotFound).contains("[-]"));
        assert!(paint_code(SearchStatus::Ambiguous).contains("[?]"));
        assert!(paint_code(SearchStatus::Failed).contains("[!]"));
    }
}
