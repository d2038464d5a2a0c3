use crate::url::NormalizeOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Markdown Spider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Seed URL the crawl starts from (depth 0)
    pub url: String,

    /// Root directory that receives the extracted documents
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum number of link hops from the seed
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of concurrent workers
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Minimum delay between two fetches of the same worker (seconds)
    #[serde(default = "default_throttle")]
    pub throttle: f64,

    /// Only follow links to the seed's host (plus `allowed_domains`)
    #[serde(default)]
    pub same_domain_only: bool,

    /// Extra hosts accepted when `same_domain_only` is set (`*.` wildcards allowed)
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Output format of the extracted documents
    #[serde(default)]
    pub format: OutputFormat,

    /// Maximum number of child URLs kept per page (document order)
    #[serde(default)]
    pub max_children_per_page: Option<usize>,

    /// Maximum number of pages processed in one run
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Overwrite documents that already exist on disk
    #[serde(default)]
    pub force_overwrite: bool,

    /// Canonicalize `/a/` and `/a` to the same URL
    #[serde(default = "default_true")]
    pub strip_trailing_slash: bool,

    /// Drop `utm_*` style tracking parameters during canonicalization
    #[serde(default)]
    pub strip_tracking_params: bool,

    /// Only follow links that match one of the configured path prefixes
    #[serde(default)]
    pub restrict_to_path_configs: bool,

    /// Where to write a markdown report of the run, if anywhere
    #[serde(default)]
    pub summary_path: Option<PathBuf>,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Cookies sent with every request
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,

    /// Path-specific extraction rules
    #[serde(default)]
    pub path_configs: Vec<PathConfigEntry>,
}

impl Config {
    /// Creates a configuration for `url` with every other field at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_dir: default_output_dir(),
            max_depth: default_max_depth(),
            num_threads: default_num_threads(),
            throttle: default_throttle(),
            same_domain_only: false,
            allowed_domains: Vec::new(),
            format: OutputFormat::default(),
            max_children_per_page: None,
            max_pages: None,
            timeout: default_timeout(),
            force_overwrite: false,
            strip_trailing_slash: true,
            strip_tracking_params: false,
            restrict_to_path_configs: false,
            summary_path: None,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            path_configs: Vec::new(),
        }
    }

    pub fn throttle_duration(&self) -> Duration {
        Duration::from_secs_f64(self.throttle.max(0.0))
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            strip_trailing_slash: self.strip_trailing_slash,
            strip_tracking_params: self.strip_tracking_params,
        }
    }
}

/// One `[[path-configs]]` entry as written in the configuration file
///
/// Selectors and patterns are kept as strings here; they are compiled into a
/// [`crate::rules::RuleTable`] before the crawl starts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathConfigEntry {
    /// Absolute URL prefix (`https://ex.com/docs/`) or path prefix (`/docs/`)
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// CSS selectors for the content to keep, in order; `["body"]` when empty
    #[serde(default)]
    pub target_content: Vec<String>,

    /// CSS selectors removed from the kept content
    #[serde(default)]
    pub ignore_selectors: Vec<String>,

    /// URL patterns (substring or regex) never followed
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// When non-empty, only URLs matching one of these are followed
    #[serde(default)]
    pub include_patterns: Vec<String>,

    #[serde(default)]
    pub description: String,
}

/// Format of the documents written to disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "md", alias = "markdown")]
    Markdown,
    #[serde(rename = "html")]
    Html,
}

impl OutputFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "html" | "htm" => Ok(Self::Html),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./crawled_content")
}

fn default_max_depth() -> u32 {
    3
}

fn default_num_threads() -> usize {
    8
}

fn default_throttle() -> f64 {
    0.5
}

fn default_timeout() -> f64 {
    10.0
}

fn default_true() -> bool {
    true
}
