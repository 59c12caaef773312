//! Run settings: file locations and harvest tuning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runner::DEFAULT_MAX_PASSES;

/// Settings for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Input and output file locations
    #[serde(default)]
    pub files: FileConfig,

    /// Fetch and retry tuning
    #[serde(default)]
    pub harvest: HarvestConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            files: FileConfig::default(),
            harvest: HarvestConfig::default(),
        }
    }
}

/// Input and output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Rules file (publisher/journal matching rules)
    #[serde(default = "default_rules_file")]
    pub rules: PathBuf,

    /// Article list to harvest
    #[serde(default = "default_articles_file")]
    pub articles: PathBuf,

    /// Output sheet written during the run
    #[serde(default = "default_output_file")]
    pub output: PathBuf,

    /// Per-journal report written at the end
    #[serde(default = "default_report_file")]
    pub report: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            rules: default_rules_file(),
            articles: default_articles_file(),
            output: default_output_file(),
            report: default_report_file(),
        }
    }
}

fn default_rules_file() -> PathBuf {
    PathBuf::from("./config.csv")
}

fn default_articles_file() -> PathBuf {
    PathBuf::from("./urls.csv")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("./output.csv")
}

fn default_report_file() -> PathBuf {
    PathBuf::from("./log.txt")
}

/// Fetch and retry tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Passes over the working set before leftovers are dropped
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pin one user agent instead of rotating per session
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

fn default_timeout_secs() -> u64 {
    30
}

/// Load settings, layering environment overrides (prefix `DAS_HARVESTER`,
/// nested keys joined with `__`) over an optional TOML file.
///
/// With no explicit path, `./das-harvester.toml` is used when present,
/// falling back to `das-harvester/config.toml` under the platform config
/// directory; both are optional. An explicit path must exist.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, config::ConfigError> {
    let mut builder = config::Config::builder();
    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path));
        }
        None => {
            if let Some(path) = default_config_file() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder
        .add_source(config::Environment::with_prefix("DAS_HARVESTER").separator("__"))
        .build()?
        .try_deserialize()
}

fn default_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("./das-harvester.toml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|dir| dir.join("das-harvester").join("config.toml"))
}

/// Render the default settings as a TOML document, for seeding a config
/// file to edit.
pub fn default_toml() -> String {
    toml::to_string_pretty(&Settings::default()).unwrap_or_default()
}
