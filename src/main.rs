use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use das_harvester::config::{self, Settings};
use das_harvester::engine;
use das_harvester::fetch::{DocumentFetcher, HttpFetcher};
use das_harvester::io::{self, CsvSink};
use das_harvester::models::{normalize_key, Article};
use das_harvester::report::AnalysisLog;
use das_harvester::rules::RuleRegistry;
use das_harvester::runner::Runner;
use das_harvester::ui::{self, ConsoleUi, NoopObserver, ProgressObserver};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DAS Harvester - Extract data availability statements from journal article pages
#[derive(Parser, Debug)]
#[command(name = "das-harvester")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Harvest data availability statements from journal article pages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest every article in the list (default when no command is given)
    #[command(alias = "r")]
    Run {
        /// Rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Article list
        #[arg(long)]
        articles: Option<PathBuf>,

        /// Output sheet
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Passes over the working set before leftovers are dropped
        #[arg(long)]
        max_passes: Option<usize>,
    },

    /// List loaded journals with their resolved rules
    #[command(alias = "ls")]
    Rules {
        /// Return JSON output instead of a table
        #[arg(long, short)]
        json: bool,
    },

    /// Fetch one page and show what the rules extract from it
    #[command(alias = "p")]
    Probe {
        /// Journal whose rules to apply
        journal: String,

        /// Page URL to fetch
        link: String,

        /// Return JSON output instead of text
        #[arg(long, short)]
        json: bool,
    },

    /// Print a default configuration file to stdout
    #[command(alias = "init")]
    InitConfig,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing(cli: &Cli) {
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("das_harvester={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut settings = config::load_settings(cli.config.as_deref()).context("loading settings")?;
    if let Some(timeout) = cli.timeout {
        settings.harvest.timeout_secs = timeout;
    }

    let command = cli.command.unwrap_or(Commands::Run {
        rules: None,
        articles: None,
        output: None,
        report: None,
        max_passes: None,
    });

    match command {
        Commands::Run {
            rules,
            articles,
            output,
            report,
            max_passes,
        } => {
            if let Some(path) = rules {
                settings.files.rules = path;
            }
            if let Some(path) = articles {
                settings.files.articles = path;
            }
            if let Some(path) = output {
                settings.files.output = path;
            }
            if let Some(path) = report {
                settings.files.report = path;
            }
            if let Some(passes) = max_passes {
                settings.harvest.max_passes = passes;
            }
            run_harvest(&settings, cli.quiet).await
        }

        Commands::Rules { json } => list_rules(&settings, json),

        Commands::Probe { journal, link, json } => probe(&settings, &journal, &link, json).await,

        Commands::InitConfig => {
            print!("{}", config::default_toml());
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load everything, drive the runner over all passes, write the report.
async fn run_harvest(settings: &Settings, quiet: bool) -> Result<()> {
    if !quiet && ui::is_terminal() {
        ui::print_banner();
    }

    let rules = io::load_rules(&settings.files.rules)
        .with_context(|| format!("reading rules from {}", settings.files.rules.display()))?;
    let registry = RuleRegistry::new(rules);
    info!(
        rules = registry.len(),
        journals = registry.journals().count(),
        "rule registry ready"
    );

    let articles = io::load_articles(&settings.files.articles)
        .with_context(|| format!("reading articles from {}", settings.files.articles.display()))?;
    if articles.is_empty() {
        warn!(path = %settings.files.articles.display(), "article list is empty");
    }

    let mut fetcher = HttpFetcher::new(
        Duration::from_secs(settings.harvest.timeout_secs),
        settings.harvest.user_agent.clone(),
    )
    .context("building fetch session")?;
    let mut sink = CsvSink::create(&settings.files.output)
        .with_context(|| format!("creating output sheet {}", settings.files.output.display()))?;
    let mut log = AnalysisLog::new();
    let mut observer: Box<dyn ProgressObserver> = if quiet || !ui::is_terminal() {
        Box::new(NoopObserver)
    } else {
        Box::new(ConsoleUi::new())
    };

    let summary = Runner::new(&registry, &mut fetcher, &mut sink, observer.as_mut(), &mut log)
        .with_max_passes(settings.harvest.max_passes)
        .run(articles)
        .await;

    let report = log.generate_log();
    std::fs::write(&settings.files.report, report)
        .with_context(|| format!("writing report to {}", settings.files.report.display()))?;

    if !quiet {
        if let Some(total) = log.total_report() {
            println!("{}", total);
        }
        println!(
            "Full report available in {}",
            settings.files.report.display()
        );
    }
    info!(
        passes = summary.passes,
        processed = summary.processed,
        aborted = summary.aborted_passes,
        dropped = summary.dropped,
        "harvest finished"
    );
    Ok(())
}

/// Print every journal with its resolved rule set.
fn list_rules(settings: &Settings, json: bool) -> Result<()> {
    let rules = io::load_rules(&settings.files.rules)
        .with_context(|| format!("reading rules from {}", settings.files.rules.display()))?;
    let registry = RuleRegistry::new(rules);

    if json {
        let listing: Vec<serde_json::Value> = registry
            .journals()
            .map(|journal| {
                serde_json::json!({
                    "journal": journal,
                    "rules": registry.rules_for(journal),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let mut table = comfy_table::Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Journal", "Rules", "Identifiers"]);

    for journal in registry.journals() {
        let resolved = registry.rules_for(journal);
        let identifiers: Vec<&str> = resolved
            .iter()
            .map(|rule| rule.identifier.as_str())
            .collect();
        table.add_row(vec![
            comfy_table::Cell::new(journal).add_attribute(comfy_table::Attribute::Bold),
            comfy_table::Cell::new(resolved.len()),
            comfy_table::Cell::new(ui::truncate_with_ellipsis(&identifiers.join(", "), 60)),
        ]);
    }
    println!("{table}");
    println!(
        "{} journal(s), {} rule(s) loaded from {}",
        registry.journals().count(),
        registry.len(),
        settings.files.rules.display()
    );
    Ok(())
}

/// Fetch a single page and show the extraction outcome.
async fn probe(settings: &Settings, journal: &str, link: &str, json: bool) -> Result<()> {
    let rules = io::load_rules(&settings.files.rules)
        .with_context(|| format!("reading rules from {}", settings.files.rules.display()))?;
    let registry = RuleRegistry::new(rules);
    let journal = normalize_key(journal);
    let resolved = registry.rules_for(&journal);
    if resolved.is_empty() {
        warn!(journal = %journal, "no rules for this journal");
    }

    let mut fetcher = HttpFetcher::new(
        Duration::from_secs(settings.harvest.timeout_secs),
        settings.harvest.user_agent.clone(),
    )
    .context("building fetch session")?;
    let html = fetcher.fetch(link).await.context("fetching page")?;

    let article = Article::new(journal.as_str(), link);
    let result = engine::extract(&html, &article, &resolved);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ui::print_section("Extraction");
        println!("{} {}", result.status_codes(), result.link);
        println!("  title:     {}", result.title);
        println!("  authors:   {}", result.authors);
        println!("  statement: {}", result.statement);
        if !result.notes.is_empty() {
            println!("  notes:     {}", result.notes);
        }
    }
    Ok(())
}
