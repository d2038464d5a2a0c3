//! Markdown Spider: a rule-driven documentation crawler
//!
//! This crate crawls the pages reachable from a seed URL, extracts the
//! content selected by path-specific rules, converts it to Markdown (or
//! cleaned HTML) and writes one file per page into a directory tree that
//! mirrors the site's URL structure.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod rules;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Markdown Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::VisitStatus,
        to: state::VisitStatus,
    },
}

/// Configuration-specific errors
///
/// All of these are raised before any page is fetched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid domain pattern: {0}")]
    InvalidDomain(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;


// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlHandle, Crawler};
pub use output::CrawlSummary;
pub use state::{Frontier, VisitStatus};
pub use crate::url::{normalize, NormalizeOptions};
