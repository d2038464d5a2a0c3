//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitStatus` / `VisitRecord`: the per-URL lifecycle (pending, then success, failed or skipped)
//! - `Frontier`: the shared dedup store and breadth-first work queue

mod frontier;
mod page_state;

// Re-export main types
pub use frontier::{Claim, CrawlTask, Enqueue, Frontier, StatusCounts};
pub use page_state::{VisitOutcome, VisitRecord, VisitStatus};
