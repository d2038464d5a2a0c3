/// Visit state definitions for tracking crawl progress
///
/// Every URL the crawl learns about gets exactly one [`VisitRecord`]. The
/// record starts out pending and moves once to a terminal status.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitStatus {
    /// URL is queued or being processed
    Pending,

    /// Page was fetched, extracted and written
    Success,

    /// Page could not be fetched (network error, timeout, HTTP error)
    Failed,

    /// Page was deliberately not processed (non-HTML, nothing matched, too deep)
    Skipped,
}

impl VisitStatus {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal result of processing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    Success,
    Failed(String),
    Skipped(String),
}

impl VisitOutcome {
    pub fn status(&self) -> VisitStatus {
        match self {
            Self::Success => VisitStatus::Success,
            Self::Failed(_) => VisitStatus::Failed,
            Self::Skipped(_) => VisitStatus::Skipped,
        }
    }

    /// Why the URL failed or was skipped
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failed(reason) | Self::Skipped(reason) => Some(reason),
        }
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} ({})", self.status(), reason),
            None => write!(f, "{}", self.status()),
        }
    }
}

/// Everything the crawl knows about one canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub url: String,
    pub status: VisitStatus,

    /// Number of times a worker claimed this URL (0 or 1, no retries)
    pub attempts: u32,

    /// Depth at which the URL was first discovered
    pub depth: u32,

    /// Failure or skip reason, if any
    pub reason: Option<String>,
}

impl VisitRecord {
    pub fn pending(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            status: VisitStatus::Pending,
            attempts: 0,
            depth,
            reason: None,
        }
    }
}
