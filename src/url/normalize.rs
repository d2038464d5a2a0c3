use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters dropped when `strip_tracking_params` is enabled
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "mc_cid", "msclkid"];

/// Knobs for URL canonicalization
///
/// Both options are fixed for the lifetime of a crawl so every component
/// produces the same canonical form for the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Remove the trailing slash from every path except the root `/`
    pub strip_trailing_slash: bool,

    /// Drop `utm_*` and other click-tracking query parameters
    pub strip_tracking_params: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strip_trailing_slash: true,
            strip_tracking_params: false,
        }
    }
}

/// Canonicalizes a URL, resolving it against `base` when one is given
///
/// # Normalization Steps
///
/// 1. Resolve `raw` against `base` (or parse it as absolute); reject if malformed
/// 2. Reject anything that is not `http` or `https`, or that has no host
/// 3. Scheme and host are lower-cased and default ports dropped (done by the parser)
/// 4. Normalize path:
///    - Remove dot segments (`.` and `..`) and empty segments
///    - Remove trailing slash (except for root `/`) when configured
///    - Empty path becomes `/`
/// 5. Remove fragment (everything after `#`)
/// 6. Optionally drop tracking query parameters; other parameters keep their order
/// 7. Remove an empty query string (trailing `?`)
///
/// Applying `normalize` to its own output returns the same URL.
///
/// # Examples
///
/// ```
/// use markdown_spider::url::{normalize, NormalizeOptions};
///
/// let url = normalize("HTTP://Ex.COM:80/docs/#intro", None, NormalizeOptions::default()).unwrap();
/// assert_eq!(url.as_str(), "http://ex.com/docs");
/// ```
pub fn normalize(raw: &str, base: Option<&Url>, options: NormalizeOptions) -> UrlResult<Url> {
    let raw = raw.trim();

    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let normalized_path = normalize_path(url.path(), options.strip_trailing_slash);
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if options.strip_tracking_params && url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments, empty segments and,
/// optionally, the trailing slash
fn normalize_path(path: &str, strip_trailing_slash: bool) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if !strip_trailing_slash && path.ends_with('/') {
        result.push('/');
    }
    result
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
