//! Configuration module for Markdown Spider
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use markdown_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.max_depth);
//! ```

mod parser;
mod sample;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputFormat, PathConfigEntry};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use sample::{write_sample_config, SAMPLE_CONFIG};
pub use validation::validate;
