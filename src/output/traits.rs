//! Output writer trait and types
//!
//! Workers hand every fully extracted document to an [`OutputWriter`]. The
//! writer only ever sees finished content, never a partial page.

use crate::output::paths::OutputPath;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateRoot {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What a write did to the file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist before
    Created,

    /// An existing file was replaced with different content
    Updated,

    /// The file was left as it was
    Unchanged,
}

impl WriteOutcome {
    /// Returns true if bytes were written to disk
    pub fn wrote(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{}", s)
    }
}

/// Trait for output writers
///
/// Implementations are shared by every worker and must be thread-safe.
pub trait OutputWriter: Send + Sync {
    /// Writes one document
    ///
    /// # Arguments
    ///
    /// * `path` - Where the document goes, relative to the writer's root
    /// * `content` - The complete document
    ///
    /// # Returns
    ///
    /// * `Ok(WriteOutcome)` - What happened on disk
    /// * `Err(OutputError)` - The document could not be written
    fn write(&self, path: &OutputPath, content: &str) -> OutputResult<WriteOutcome>;
}
