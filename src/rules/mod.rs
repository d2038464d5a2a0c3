//! Path-specific extraction rules
//!
//! The configuration's `[[path-configs]]` entries are compiled into an
//! ordered [`RuleTable`]. Looking up a URL is a pure longest-prefix match:
//! the most specific prefix wins, ties go to the entry listed first, and a
//! URL no entry covers falls back to a whole-page default rule.

mod prefix;
mod scope;

pub use prefix::Prefix;
pub use scope::CrawlScope;

use crate::config::PathConfigEntry;
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Description used by the built-in rule
const DEFAULT_DESCRIPTION: &str = "Default configuration";

/// A compiled extraction rule
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub prefix: Prefix,

    /// Content to keep, in order
    pub target_content: Vec<Selector>,

    /// Content removed from whatever the targets selected
    pub ignore_selectors: Vec<Selector>,

    /// Links matching any of these are never followed
    pub exclude_patterns: Vec<Regex>,

    /// When non-empty, links must match one of these to be followed
    pub include_patterns: Vec<Regex>,

    pub description: String,
}

impl PathConfig {
    /// Whole-page rule used for URLs no entry covers
    pub fn default_rule() -> Self {
        Self {
            prefix: Prefix::Path("/".to_string()),
            target_content: vec![body_selector()],
            ignore_selectors: Vec::new(),
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    /// Compiles one configuration entry
    pub fn compile(entry: &PathConfigEntry) -> Result<Self, ConfigError> {
        let raw_prefix = entry
            .path_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConfigError::Validation("path_prefix is required".to_string()))?;

        let target_content = if entry.target_content.is_empty() {
            vec![body_selector()]
        } else {
            compile_selectors(&entry.target_content)?
        };

        Ok(Self {
            prefix: Prefix::parse(raw_prefix),
            target_content,
            ignore_selectors: compile_selectors(&entry.ignore_selectors)?,
            exclude_patterns: compile_patterns(&entry.exclude_patterns)?,
            include_patterns: compile_patterns(&entry.include_patterns)?,
            description: if entry.description.is_empty() {
                raw_prefix.to_string()
            } else {
                entry.description.clone()
            },
        })
    }

    /// Returns true if the exclude/include patterns let `url` through
    pub fn permits(&self, url: &Url) -> bool {
        let candidate = url.as_str();

        if self.exclude_patterns.iter().any(|p| p.is_match(candidate)) {
            return false;
        }

        self.include_patterns.is_empty() || self.include_patterns.iter().any(|p| p.is_match(candidate))
    }
}

/// Ordered table of compiled rules
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<PathConfig>,
    default: PathConfig,
}

impl RuleTable {
    /// Compiles all entries, failing on the first malformed one
    pub fn from_entries(entries: &[PathConfigEntry]) -> Result<Self, ConfigError> {
        let rules = entries
            .iter()
            .map(PathConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            default: PathConfig::default_rule(),
        })
    }

    /// Returns the most specific configured rule covering `url`, if any
    pub fn find(&self, url: &Url) -> Option<&PathConfig> {
        let mut best: Option<&PathConfig> = None;

        for rule in self.rules.iter().filter(|r| r.prefix.matches(url)) {
            // Strictly longer wins so the first of equally specific rules is kept
            if best.map_or(true, |b| rule.prefix.specificity() > b.prefix.specificity()) {
                best = Some(rule);
            }
        }

        best
    }

    /// Returns the rule for `url`, falling back to the whole-page default
    pub fn match_url(&self, url: &Url) -> &PathConfig {
        self.find(url).unwrap_or(&self.default)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathConfig> {
        self.rules.iter()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: PathConfig::default_rule(),
        }
    }
}

fn body_selector() -> Selector {
    // "body" is a static, always-valid selector
    Selector::parse("body").unwrap_or_else(|_| unreachable!("body selector parses"))
}

fn compile_selectors(sources: &[String]) -> Result<Vec<Selector>, ConfigError> {
    sources
        .iter()
        .map(|source| {
            Selector::parse(source).map_err(|e| ConfigError::InvalidSelector {
                selector: source.clone(),
                message: format!("{:?}", e),
            })
        })
        .collect()
}

fn compile_patterns(sources: &[String]) -> Result<Vec<Regex>, ConfigError> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source).map_err(|e| ConfigError::InvalidPattern {
                pattern: source.clone(),
                source: e,
            })
        })
        .collect()
}
