//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client from the configured headers and cookies
//! - GET requests to fetch page content
//! - Content-Type checks (only HTML is extracted)
//! - Error classification into failures and skips

use crate::config::Config;
use crate::{ConfigError, SpiderError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// User agent sent when the configuration does not set one
pub const DEFAULT_USER_AGENT: &str = concat!("markdown-spider/", env!("CARGO_PKG_VERSION"));

/// Content types the extractor understands
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Upper bound on establishing a connection, independent of the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("not HTML: {0}")]
    NonHtmlContentType(String),
}

impl FetchError {
    /// Returns true if the page was deliberately passed over rather than failed
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NonHtmlContentType(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// Builds the HTTP client used for the whole run
///
/// Configured headers become default headers (a `User-Agent` is added when
/// none is configured) and cookies are sent as one `Cookie` header.
/// Redirects follow reqwest's default policy.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(SpiderError)` - A header was invalid or the client could not be built
pub fn build_http_client(config: &Config) -> Result<Client, SpiderError> {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::Validation(format!("Invalid value for header '{}'", name)))?;
        headers.insert(name, value);
    }

    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }

    if let Some(cookie) = cookie_header(config) {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|_| ConfigError::Validation("Invalid cookie value".to_string()))?;
        headers.insert(COOKIE, value);
    }

    let client = Client::builder()
        .default_headers(headers)
        .timeout(config.timeout_duration())
        .connect_timeout(CONNECT_TIMEOUT.min(config.timeout_duration()))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn cookie_header(config: &Config) -> Option<String> {
    if config.cookies.is_empty() {
        return None;
    }

    Some(
        config
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Fetches one page
///
/// # Outcome Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | Connection error | `Network` (failed) |
/// | Timeout | `Timeout` (failed) |
/// | Status other than 2xx after redirects | `HttpStatus` (failed) |
/// | Content-Type missing or not HTML | `NonHtmlContentType` (skipped) |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        let shown = if content_type.is_empty() {
            "no content type".to_string()
        } else {
            content_type
        };
        return Err(FetchError::NonHtmlContentType(shown));
    }

    let final_url = response.url().clone();
    let body = response.text().await?;

    Ok(FetchedPage {
        final_url,
        status: status.as_u16(),
        content_type,
        body,
    })
}

/// Checks the media type, ignoring parameters such as `charset`
fn is_html(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_CONTENT_TYPES.contains(&essence.as_str())
}
