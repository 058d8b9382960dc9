use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{SearchError, SearchResult};
use crate::results::KeywordSet;

/// Number of workers used when nothing else is configured
pub const DEFAULT_WORKER_COUNT: NonZeroUsize = match NonZeroUsize::new(4) {
    Some(n) => n,
    None => panic!("worker count must be non-zero"),
};

/// How the scan is parallelized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Workers are threads of this process merging into shared state
    #[serde(alias = "1", alias = "thread")]
    Threads,
    /// Workers are child processes reporting back over a channel
    #[serde(alias = "2", alias = "process")]
    Processes,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Threads => "threads",
            ScanMode::Processes => "processes",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = SearchError;

    /// Accepts the menu numbers of the interactive prompt as well as the names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "thread" | "threads" => Ok(ScanMode::Threads),
            "2" | "process" | "processes" => Ok(ScanMode::Processes),
            other => Err(SearchError::invalid_mode(other)),
        }
    }
}

/// What to do with files that are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Skip the file and log the decode error
    #[default]
    FailFast,
    /// Replace invalid sequences and scan the file anyway
    Lossy,
}

impl FromStr for EncodingMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "failfast" => Ok(EncodingMode::FailFast),
            "lossy" => Ok(EncodingMode::Lossy),
            other => Err(SearchError::config_error(format!(
                "unknown encoding mode '{}', expected failfast or lossy",
                other
            ))),
        }
    }
}

/// Configuration for a keyword scan.
///
/// # Configuration Locations
///
/// Loaded from the following locations, later ones taking precedence:
/// 1. Global `$CONFIG_DIR/keyscan/config.yaml`
/// 2. Local `.keyscan.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// Every field has a default, so an empty or absent file is valid.
///
/// ```yaml
/// root_path: "texts"
/// keywords: ["слово1", "слово2", "слово3"]
/// file_suffix: ".txt"
/// worker_count: 4
/// mode: threads
/// sort_files: true
/// encoding_mode: failfast
/// log_level: "warn"
/// ```
///
/// Command-line arguments take precedence over every file, see `merge_with_cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Directory holding the text files
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Keywords to look for, in report order
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Only entries whose name ends with this suffix are scanned
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,

    /// Number of workers, each owning one contiguous slice of the file list
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Execution mode; when unset the CLI asks for one
    #[serde(default)]
    pub mode: Option<ScanMode>,

    /// Sort the file list before partitioning so worker assignment is stable
    #[serde(default = "default_sort_files")]
    pub sort_files: bool,

    /// Handling of invalid UTF-8
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from("texts")
}

fn default_keywords() -> Vec<String> {
    vec![
        "слово1".to_string(),
        "слово2".to_string(),
        "слово3".to_string(),
    ]
}

fn default_file_suffix() -> String {
    ".txt".to_string()
}

fn default_worker_count() -> NonZeroUsize {
    DEFAULT_WORKER_COUNT
}

fn default_sort_files() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            keywords: default_keywords(),
            file_suffix: default_file_suffix(),
            worker_count: default_worker_count(),
            mode: None,
            sort_files: default_sort_files(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` means "keep the file value"
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_path: Option<PathBuf>,
    pub keywords: Vec<String>,
    pub file_suffix: Option<String>,
    pub worker_count: Option<NonZeroUsize>,
    pub mode: Option<ScanMode>,
    pub sort_files: Option<bool>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, layering `config_path` over the default locations.
    ///
    /// The default locations are optional; an explicit path must exist.
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            dirs::config_dir().map(|p| p.join("keyscan/config.yaml")),
            Some(PathBuf::from(".keyscan.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SearchError::config_error(e.to_string()))
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if !cli.keywords.is_empty() {
            self.keywords = cli.keywords;
        }
        if let Some(suffix) = cli.file_suffix {
            self.file_suffix = suffix;
        }
        if let Some(count) = cli.worker_count {
            self.worker_count = count;
        }
        if cli.mode.is_some() {
            self.mode = cli.mode;
        }
        if let Some(sort) = cli.sort_files {
            self.sort_files = sort;
        }
        if let Some(encoding) = cli.encoding_mode {
            self.encoding_mode = encoding;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Validated keyword set for this configuration
    pub fn keyword_set(&self) -> SearchResult<KeywordSet> {
        KeywordSet::new(self.keywords.clone())
    }
}
