//! URL handling module for Markdown Spider
//!
//! This module provides URL canonicalization, host extraction, wildcard
//! host matching and the domain policy used to filter discovered links.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, matches_wildcard, site_key, DomainPolicy};
pub use normalize::{normalize, NormalizeOptions};
