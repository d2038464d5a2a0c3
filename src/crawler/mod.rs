//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and content-type checks
//! - Link collection from fetched pages
//! - Per-worker throttling
//! - The worker pool that drives a run

mod coordinator;
mod fetcher;
mod parser;
mod throttle;

pub use coordinator::{CrawlHandle, Crawler};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage, DEFAULT_USER_AGENT};
pub use parser::LinkCollector;
pub use throttle::Throttle;

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::SpiderError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and create the output directory
/// 2. Build the HTTP client
/// 3. Crawl breadth-first from the seed URL with `num_threads` workers
/// 4. Write one document per extracted page
/// 5. Return the run summary
///
/// # Example
///
/// ```no_run
/// use markdown_spider::config::load_config;
/// use markdown_spider::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("spider.toml"))?;
/// let summary = crawl(config).await?;
/// println!("{} pages written", summary.pages_written);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlSummary, SpiderError> {
    Crawler::new(config)?.run().await
}
