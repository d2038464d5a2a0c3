//! Content extraction
//!
//! Turns a fetched HTML page into the document that is written to disk:
//! select the rule's target content, drop ignored nodes, rewrite links into
//! the output tree and convert to the configured format. Extraction is a pure
//! function of the page, the rule and the crawl scope, so extracting the same
//! page twice yields byte-identical output.

mod markdown;
mod serialize;
mod table;

use crate::config::OutputFormat;
use crate::output::OutputPath;
use crate::rules::{CrawlScope, PathConfig};
use scraper::{ElementRef, Html, Selector};
use serialize::{Cleaner, LinkRewriter, Serialized};
use thiserror::Error;
use url::Url;

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// None of the rule's `target_content` selectors matched
    #[error("No content matched selectors of '{rule}'")]
    NoContentMatched { rule: String },

    #[error("Markdown conversion failed: {0}")]
    Conversion(String),
}

/// A fully formed document ready for the output writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub source_url: Url,
    pub output_path: OutputPath,
    pub content: String,
    pub format: OutputFormat,

    /// Text of the page's `<title>`, if any
    pub title: Option<String>,
}

/// Extracts the document for `url`, resolving links against `url` itself
///
/// Every link the scope admits is treated as part of the output tree.
pub fn extract(
    html: &str,
    rule: &PathConfig,
    url: &Url,
    scope: &CrawlScope,
) -> Result<ExtractedDocument, ExtractError> {
    extract_with_base(html, rule, url, url, scope, None)
}

/// Extracts the document for `url`
///
/// # Arguments
///
/// * `html` - Page body
/// * `rule` - Rule matched for `url`
/// * `url` - Canonical page URL; decides the output path
/// * `base` - URL relative references resolve against (the final URL after redirects)
/// * `scope` - Maps link targets to output paths
/// * `local` - Canonical URLs that will be crawled from this page; links to
///   anything else stay absolute. `None` rewrites every link the scope admits.
///
/// # Returns
///
/// * `Ok(ExtractedDocument)` - Converted content
/// * `Err(ExtractError::NoContentMatched)` - No target selector matched anything
pub fn extract_with_base(
    html: &str,
    rule: &PathConfig,
    url: &Url,
    base: &Url,
    scope: &CrawlScope,
    local: Option<&[Url]>,
) -> Result<ExtractedDocument, ExtractError> {
    let document = Html::parse_document(html);

    let targets = select_targets(&document, &rule.target_content);
    if targets.is_empty() {
        return Err(ExtractError::NoContentMatched {
            rule: rule.description.clone(),
        });
    }

    let format = scope.format();
    let output_path = scope.output_path(url);
    let cleaner = Cleaner {
        ignore: &rule.ignore_selectors,
        links: LinkRewriter {
            scope,
            base,
            page_path: &output_path,
            local,
        },
        markdown: format == OutputFormat::Markdown,
    };

    let mut out = Serialized::default();
    for (i, target) in targets.into_iter().enumerate() {
        if i > 0 {
            out.html.push('\n');
        }
        cleaner.write(target, &mut out);
    }

    let content = match format {
        OutputFormat::Markdown => markdown::render(&out)?,
        OutputFormat::Html => {
            out.html.push('\n');
            out.html
        }
    };

    Ok(ExtractedDocument {
        source_url: url.clone(),
        output_path,
        content,
        format,
        title: page_title(&document),
    })
}

/// Collects matches of each selector in order
///
/// A match that lies inside an already collected subtree is skipped so
/// overlapping selectors never duplicate content.
fn select_targets<'a>(document: &'a Html, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    let mut collected: Vec<ElementRef<'a>> = Vec::new();

    for selector in selectors {
        for element in document.select(selector) {
            let covered = collected.iter().any(|c| {
                c.id() == element.id() || element.ancestors().any(|a| a.id() == c.id())
            });
            if !covered {
                collected.push(element);
            }
        }
    }

    collected
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title: String = document.select(&selector).next()?.text().collect();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}
