//! Run statistics
//!
//! The summary is built from the frontier's visit records once the worker
//! pool has finished.

use crate::state::{VisitRecord, VisitStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Summary statistics for a crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,

    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    /// URLs still pending when the run ended (page cap or stop)
    pub unfinished: usize,

    /// Documents that were created or updated on disk
    pub pages_written: usize,

    /// Failed URLs with their reasons, sorted by URL
    pub failures: Vec<(String, String)>,

    /// Skipped URLs with their reasons, sorted by URL
    pub skips: Vec<(String, String)>,

    /// Whether the run was stopped before the frontier drained
    pub stopped: bool,
}

impl CrawlSummary {
    /// Tallies visit records into a summary
    ///
    /// # Arguments
    ///
    /// * `records` - Every record the frontier holds
    /// * `started_at` - When the run began
    /// * `duration` - Wall-clock length of the run
    /// * `pages_written` - Count reported by the workers
    pub fn from_records(
        records: &[VisitRecord],
        started_at: DateTime<Utc>,
        duration: Duration,
        pages_written: usize,
    ) -> Self {
        let mut summary = Self {
            started_at,
            duration,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            unfinished: 0,
            pages_written,
            failures: Vec::new(),
            skips: Vec::new(),
            stopped: false,
        };

        for record in records {
            let reason = || record.reason.clone().unwrap_or_default();
            match record.status {
                VisitStatus::Success => summary.succeeded += 1,
                VisitStatus::Failed => {
                    summary.failed += 1;
                    summary.failures.push((record.url.clone(), reason()));
                }
                VisitStatus::Skipped => {
                    summary.skipped += 1;
                    summary.skips.push((record.url.clone(), reason()));
                }
                VisitStatus::Pending => summary.unfinished += 1,
            }
        }

        summary.failures.sort();
        summary.skips.sort();
        summary
    }

    /// Number of URLs that reached a terminal state
    pub fn total_processed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total_processed();
        if total == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / total as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Started: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Duration: {:.1}s", summary.duration.as_secs_f64());
    if summary.stopped {
        println!("Run was stopped before the frontier drained");
    }
    println!();

    println!("Pages:");
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    println!("  Skipped: {}", summary.skipped);
    if summary.unfinished > 0 {
        println!("  Not processed: {}", summary.unfinished);
    }
    println!("  Files written: {}", summary.pages_written);
    println!();

    if !summary.failures.is_empty() {
        println!("Failures ({}):", summary.failures.len());
        for (url, reason) in summary.failures.iter().take(20) {
            println!("  - {}: {}", url, reason);
        }
        if summary.failures.len() > 20 {
            println!("  ... and {} more", summary.failures.len() - 20);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        summary.success_rate(),
        summary.succeeded,
        summary.total_processed()
    );
}
