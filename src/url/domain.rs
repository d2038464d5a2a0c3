use url::Url;

/// Extracts the lower-cased host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use markdown_spider::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns `host` or `host:port` when the port is not the scheme default
///
/// Two URLs belong to the same site exactly when their site keys are equal.
pub fn site_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain at any depth.
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Host filter applied to every discovered link
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    base_site: String,
    same_domain_only: bool,
    allowed: Vec<String>,
}

impl DomainPolicy {
    /// Builds a policy anchored on the seed URL
    ///
    /// With `same_domain_only` unset every host is accepted. Otherwise only
    /// the seed's site and hosts matching one of `allowed` (exact or
    /// `*.`-wildcard, compared lower-case) pass.
    pub fn new(seed: &Url, same_domain_only: bool, allowed: &[String]) -> Self {
        Self {
            base_site: site_key(seed).unwrap_or_default(),
            same_domain_only,
            allowed: allowed.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Returns true if links to `url` may be followed
    pub fn allows(&self, url: &Url) -> bool {
        if !self.same_domain_only {
            return true;
        }

        if self.is_base_site(url) {
            return true;
        }

        match extract_domain(url) {
            Some(host) => self.allowed.iter().any(|p| matches_wildcard(p, &host)),
            None => false,
        }
    }

    /// Returns true if `url` lives on the seed's host and port
    pub fn is_base_site(&self, url: &Url) -> bool {
        site_key(url).is_some_and(|site| site == self.base_site)
    }

    /// The seed's `host[:port]`
    pub fn base_site(&self) -> &str {
        &self.base_site
    }
}
