//! Mapping from canonical URLs to output file paths
//!
//! The mapping is a pure function of the URL, the seed site and the file
//! extension, so any component can compute where a page is (or will be)
//! written without asking the writer.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Number of hex characters of the query hash appended to the file stem
const QUERY_HASH_LEN: usize = 12;

/// Directory holding pages from hosts other than the seed site
const EXTERNAL_DIR: &str = "_ext";

/// A relative output path, kept as `/`-free segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputPath {
    segments: Vec<String>,
}

impl OutputPath {
    /// Computes the output path for `url`
    ///
    /// # Arguments
    ///
    /// * `url` - Canonical page URL
    /// * `base_site` - `host[:port]` of the seed; pages there live directly under the root
    /// * `extension` - File extension without the dot
    ///
    /// # Examples
    ///
    /// ```
    /// use markdown_spider::output::OutputPath;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://ex.com/docs/intro").unwrap();
    /// let path = OutputPath::for_url(&url, "ex.com", "md");
    /// assert_eq!(path.to_string(), "docs/intro.md");
    /// ```
    pub fn for_url(url: &Url, base_site: &str, extension: &str) -> Self {
        let mut segments = Vec::new();

        let external = match site_dir(url) {
            Some(site) if site.key != base_site => {
                segments.push(EXTERNAL_DIR.to_string());
                segments.push(site.dir);
                true
            }
            _ => false,
        };

        let parts: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
        let (dirs, stem) = match parts.split_last() {
            // Trailing slash: the page is the directory's index
            Some(_) if url.path().ends_with('/') => (&parts[..], "index"),
            Some((last, dirs)) => (dirs, *last),
            None => (&parts[..], "index"),
        };

        for (i, dir) in dirs.iter().enumerate() {
            let mut segment = escape_segment(dir);
            // A seed-site directory must never shadow the external hosts directory
            if i == 0 && !external && segment == EXTERNAL_DIR {
                segment = format!("%5F{}", &EXTERNAL_DIR[1..]);
            }
            segments.push(segment);
        }

        let mut file = escape_segment(stem);
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            file.push('_');
            file.push_str(&query_hash(query));
        }
        file.push('.');
        file.push_str(extension);
        segments.push(file);

        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Filesystem path relative to the output root
    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// Link from the page at `from` to this page, as a relative `/`-separated path
    ///
    /// Segments are URL-escaped, so the link resolves to the file name on disk
    /// even when that name contains `%` escapes.
    pub fn relative_to(&self, from: &OutputPath) -> String {
        let from_dirs = &from.segments[..from.segments.len().saturating_sub(1)];
        let common = from_dirs
            .iter()
            .zip(&self.segments)
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<String> = Vec::new();
        parts.extend(std::iter::repeat("..".to_string()).take(from_dirs.len() - common));
        parts.extend(self.segments[common..].iter().map(|s| link_escape(s)));
        parts.join("/")
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

struct SiteDir {
    key: String,
    dir: String,
}

fn site_dir(url: &Url) -> Option<SiteDir> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => SiteDir {
            key: format!("{}:{}", host, port),
            dir: escape_segment(&format!("{}_{}", host, port)),
        },
        None => SiteDir {
            key: host.to_string(),
            dir: escape_segment(host),
        },
    })
}

/// Percent-escapes characters that common filesystems reject
///
/// `%` itself is escaped too, so an escaped name never equals a literal one.
fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' | '<' | '>' | ':' | '"' | '\\' | '|' | '*' | '?' => {
                out.push_str(&format!("%{:02X}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a file name for use inside a relative link
fn link_escape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' | ' ' | '#' | '(' | ')' => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn query_hash(query: &str) -> String {
    let digest = hex::encode(Sha256::digest(query.as_bytes()));
    digest[..QUERY_HASH_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(url: &str) -> String {
        OutputPath::for_url(&Url::parse(url).unwrap(), "ex.com", "md").to_string()
    }

    #[test]
    fn test_root_maps_to_index() {
        assert_eq!(path("https://ex.com/"), "index.md");
        assert_eq!(path("https://ex.com"), "index.md");
    }

    #[test]
    fn test_segments_become_directories() {
        assert_eq!(path("https://ex.com/a"), "a.md");
        assert_eq!(path("https://ex.com/docs/api/x"), "docs/api/x.md");
        assert_eq!(path("https://ex.com/docs/"), "docs/index.md");
    }

    #[test]
    fn test_nested_and_leaf_do_not_collide() {
        assert_ne!(path("https://ex.com/docs"), path("https://ex.com/docs/intro"));
        assert_ne!(path("https://ex.com/guide"), path("https://ex.com/guide.html"));
    }

    #[test]
    fn test_other_hosts_get_a_directory() {
        assert_eq!(path("https://other.com/c"), "_ext/other.com/c.md");
        assert_eq!(path("http://ex.com:8080/c"), "_ext/ex.com_8080/c.md");
        assert_eq!(
            OutputPath::for_url(&Url::parse("http://127.0.0.1:8080/a").unwrap(), "127.0.0.1:8080", "html")
                .to_string(),
            "a.html"
        );
    }

    #[test]
    fn test_query_gets_hashed_suffix() {
        let a = path("https://ex.com/search?q=a");
        let b = path("https://ex.com/search?q=b");
        assert!(a.starts_with("search_"));
        assert!(a.ends_with(".md"));
        assert_eq!(a.len(), "search_".len() + QUERY_HASH_LEN + ".md".len());
        assert_ne!(a, b);
        assert_eq!(a, path("https://ex.com/search?q=a"));
    }

    #[test]
    fn test_illegal_characters_escaped() {
        assert_eq!(path("https://ex.com/a:b*c|d"), "a%3Ab%2Ac%7Cd.md");
    }

    #[test]
    fn test_percent_escaped_so_names_stay_distinct() {
        assert_eq!(path("https://ex.com/a%3Ab"), "a%253Ab.md");
        assert_ne!(path("https://ex.com/a:b"), path("https://ex.com/a%3Ab"));
    }

    #[test]
    fn test_seed_path_never_shadows_external_host() {
        let local = path("https://ex.com/other.com/x");
        let external = path("https://other.com/x");
        assert_eq!(local, "other.com/x.md");
        assert_eq!(external, "_ext/other.com/x.md");

        let lookalike = path("https://ex.com/_ext/other.com/x");
        assert_eq!(lookalike, "%5Fext/other.com/x.md");
        assert_ne!(lookalike, external);
        assert_eq!(path("https://ex.com/docs/_ext/x"), "docs/_ext/x.md");
    }

    #[test]
    fn test_relative_link_escapes_file_names() {
        let p = |u: &str| OutputPath::for_url(&Url::parse(u).unwrap(), "ex.com", "md");
        let index = p("https://ex.com/");
        assert_eq!(p("https://ex.com/a:b").relative_to(&index), "a%253Ab.md");
        assert_eq!(p("https://ex.com/with%20space").relative_to(&index), "with%252520space.md");
    }

    #[test]
    fn test_relative_links() {
        let p = |u: &str| OutputPath::for_url(&Url::parse(u).unwrap(), "ex.com", "md");

        let index = p("https://ex.com/");
        let a = p("https://ex.com/a");
        let deep = p("https://ex.com/docs/api/x");
        let sibling = p("https://ex.com/docs/api/y");
        let other = p("https://other.com/c");

        assert_eq!(a.relative_to(&index), "a.md");
        assert_eq!(index.relative_to(&deep), "../../index.md");
        assert_eq!(sibling.relative_to(&deep), "y.md");
        assert_eq!(deep.relative_to(&a), "docs/api/x.md");
        assert_eq!(other.relative_to(&deep), "../../_ext/other.com/c.md");
        assert_eq!(a.relative_to(&a), "a.md");
    }

    #[test]
    fn test_to_path_buf() {
        let p = OutputPath::for_url(&Url::parse("https://ex.com/docs/x").unwrap(), "ex.com", "md");
        assert_eq!(p.to_path_buf(), PathBuf::from("docs").join("x.md"));
    }
}
