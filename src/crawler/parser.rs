//! Link collection
//!
//! Finds the child URLs of a page: every followable `<a href>` resolved,
//! canonicalized and filtered through the crawl scope, in document order.

use crate::rules::CrawlScope;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Schemes that never lead to a crawlable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Collects child URLs from a page
#[derive(Debug, Clone, Copy)]
pub struct LinkCollector<'a> {
    pub scope: &'a CrawlScope,

    /// Anchors inside nodes matching these are not followed
    pub ignore: &'a [Selector],

    /// Keep at most this many links (the first ones in document order)
    pub max_children: Option<usize>,
}

impl LinkCollector<'_> {
    /// Returns the accepted child URLs of a page
    ///
    /// # Link Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">` anywhere in the document outside ignored nodes
    ///
    /// **Exclude:**
    /// - `<a href="..." download>`
    /// - fragment-only, `javascript:`, `mailto:`, `tel:` and `data:` links
    /// - links the scope does not admit (domain policy, exclude/include patterns)
    /// - the page itself and repeats of an earlier link
    ///
    /// # Arguments
    ///
    /// * `html` - Page body
    /// * `page` - Canonical URL of the page
    /// * `base` - URL relative links resolve against (final URL after redirects)
    pub fn collect(&self, html: &str, page: &Url, base: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(page.as_str().to_string());

        let mut links = Vec::new();
        for element in document.select(&anchor) {
            if element.value().attr("download").is_some() || self.is_ignored(element) {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !is_followable(href) {
                continue;
            }

            let Some(url) = self.scope.resolve(href, base) else {
                tracing::debug!("Dropping unresolvable link '{}' on {}", href, page);
                continue;
            };

            if !seen.insert(url.as_str().to_string()) {
                continue;
            }

            if !self.scope.admits(&url) {
                continue;
            }

            links.push(url);
        }

        if let Some(max) = self.max_children {
            if links.len() > max {
                tracing::debug!(
                    "Limiting child URLs of {} from {} to {}",
                    page,
                    links.len(),
                    max
                );
                links.truncate(max);
            }
        }

        links
    }

    fn is_ignored(&self, element: ElementRef<'_>) -> bool {
        if self.ignore.is_empty() {
            return false;
        }

        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .any(|el| self.ignore.iter().any(|s| s.matches(&el)))
    }
}

fn is_followable(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PathConfigEntry};

    fn scope(config: Config) -> CrawlScope {
        CrawlScope::from_config(&config).unwrap()
    }

    fn same_domain() -> CrawlScope {
        let mut config = Config::new("https://ex.com/");
        config.same_domain_only = true;
        scope(config)
    }

    fn collect(scope: &CrawlScope, html: &str, max_children: Option<usize>) -> Vec<String> {
        let page = Url::parse("https://ex.com/").unwrap();
        LinkCollector {
            scope,
            ignore: &[],
            max_children,
        }
        .collect(html, &page, &page)
        .into_iter()
        .map(|u| u.to_string())
        .collect()
    }

    #[test]
    fn test_relative_links_resolved_and_canonical() {
        let links = collect(
            &same_domain(),
            r#"<a href="/a">A</a><a href="b/">B</a><a href="https://EX.com/c#frag">C</a>"#,
            None,
        );
        assert_eq!(
            links,
            vec!["https://ex.com/a", "https://ex.com/b", "https://ex.com/c"]
        );
    }

    #[test]
    fn test_skipped_link_kinds() {
        let links = collect(
            &same_domain(),
            r##"<a href="#top">t</a>
               <a href="javascript:void(0)">j</a>
               <a href="mailto:a@ex.com">m</a>
               <a href="tel:123">p</a>
               <a href="/file.zip" download>d</a>
               <a href="">e</a>
               <a href="/">self</a>
               <a href="/ok">ok</a>"##,
            None,
        );
        assert_eq!(links, vec!["https://ex.com/ok"]);
    }

    #[test]
    fn test_external_links_follow_domain_policy() {
        let html = r#"<a href="/a">A</a><a href="https://other.com/c">C</a>"#;

        assert_eq!(collect(&same_domain(), html, None), vec!["https://ex.com/a"]);

        let open = scope(Config::new("https://ex.com/"));
        assert_eq!(collect(&open, html, None).len(), 2);
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let links = collect(
            &same_domain(),
            r#"<a href="/b">B</a><a href="/a">A</a><a href="/b/">B again</a>"#,
            None,
        );
        assert_eq!(links, vec!["https://ex.com/b", "https://ex.com/a"]);
    }

    #[test]
    fn test_max_children_keeps_first_in_document_order() {
        let html: String = (0..50)
            .map(|i| format!(r#"<a href="/page-{}">{}</a>"#, i, i))
            .collect();

        let links = collect(&same_domain(), &html, Some(5));
        let expected: Vec<String> = (0..5).map(|i| format!("https://ex.com/page-{}", i)).collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_exclude_patterns_of_candidate_rule() {
        let mut config = Config::new("https://ex.com/");
        config.path_configs = vec![PathConfigEntry {
            path_prefix: Some("/docs/".to_string()),
            exclude_patterns: vec!["/go/".to_string()],
            ..Default::default()
        }];
        let links = collect(
            &scope(config),
            r#"<a href="/docs/go/x">go</a><a href="/docs/python/x">py</a>"#,
            None,
        );
        assert_eq!(links, vec!["https://ex.com/docs/python/x"]);
    }

    #[test]
    fn test_links_in_ignored_nodes_not_followed() {
        let scope = same_domain();
        let ignore = vec![Selector::parse("nav").unwrap()];
        let page = Url::parse("https://ex.com/").unwrap();
        let collector = LinkCollector {
            scope: &scope,
            ignore: &ignore,
            max_children: None,
        };

        let links = collector.collect(
            r#"<nav><ul><li><a href="/menu">Menu</a></li></ul></nav><main><a href="/body">Body</a></main>"#,
            &page,
            &page,
        );
        assert_eq!(links, vec![Url::parse("https://ex.com/body").unwrap()]);
    }
}
