//! Output module: where extracted documents and run reports go
//!
//! This module handles:
//! - Mapping canonical URLs to output file paths
//! - Writing documents atomically into the output tree
//! - Summarizing a run on stdout and as a markdown report

mod filesystem;
mod markdown;
mod paths;
pub mod stats;
mod traits;

pub use filesystem::FileSystemWriter;
pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use paths::OutputPath;
pub use stats::{print_summary, CrawlSummary};
pub use traits::{OutputError, OutputResult, OutputWriter, WriteOutcome};
