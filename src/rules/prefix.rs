use url::Url;

/// A `path_prefix` from the configuration, ready for matching
///
/// Prefixes starting with `/` are compared with the URL's path (and query);
/// anything else is compared with the whole URL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    Absolute { text: String, path_len: usize },
    Path(String),
}

impl Prefix {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('/') {
            return Self::Path(raw.to_string());
        }

        // Lower-cases scheme and host so the prefix lines up with canonical URLs
        match Url::parse(raw) {
            Ok(mut url) if url.has_host() => {
                url.set_fragment(None);
                let path_len = url.path().len() + url.query().map_or(0, |q| q.len() + 1);
                Self::Absolute {
                    text: url.to_string(),
                    path_len,
                }
            }
            _ => Self::Absolute {
                text: raw.to_string(),
                path_len: raw.len(),
            },
        }
    }

    /// How much of the URL path this prefix pins down; longer is more specific
    pub fn specificity(&self) -> usize {
        match self {
            Self::Absolute { path_len, .. } => *path_len,
            Self::Path(text) => text.len(),
        }
    }

    /// Returns true if this prefix covers `url`
    ///
    /// A prefix ending in `/` also covers the same URL without that slash, so
    /// `https://ex.com/docs/` covers the canonical `https://ex.com/docs`.
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::Absolute { text, .. } => covers(text, url.as_str()),
            Self::Path(text) => {
                let target = match url.query() {
                    Some(query) => format!("{}?{}", url.path(), query),
                    None => url.path().to_string(),
                };
                covers(text, &target)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Absolute { text, .. } => text,
            Self::Path(text) => text,
        }
    }
}

fn covers(prefix: &str, candidate: &str) -> bool {
    candidate.starts_with(prefix)
        || prefix
            .strip_suffix('/')
            .is_some_and(|trimmed| !trimmed.is_empty() && candidate == trimmed)
}
