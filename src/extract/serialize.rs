//! Serializes selected subtrees back to HTML while cleaning them
//!
//! The document is never mutated. Ignored nodes, `script` and `style` are
//! simply not written, and link targets are rewritten on the way out. When
//! preparing for Markdown, tables are rendered here (see [`Serialized`]).

use super::markdown;
use super::table::{self, Layout};
use crate::output::OutputPath;
use crate::rules::CrawlScope;
use scraper::{ElementRef, Node, Selector};
use url::Url;

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements dropped from every document
const ALWAYS_DROPPED: &[&str] = &["script", "style"];

/// Rewrites link targets relative to the page being written
#[derive(Clone, Copy)]
pub(crate) struct LinkRewriter<'a> {
    pub scope: &'a CrawlScope,

    /// Base for resolving relative references (the final response URL)
    pub base: &'a Url,

    /// Where the page itself is written
    pub page_path: &'a OutputPath,

    /// Targets that will be crawled from this page; `None` trusts the scope alone
    pub local: Option<&'a [Url]>,
}

impl LinkRewriter<'_> {
    /// Hyperlinks to pages this crawl writes become relative paths into the
    /// output tree; everything else becomes absolute
    fn href(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return raw.to_string();
        }

        let Ok(absolute) = self.base.join(trimmed) else {
            return raw.to_string();
        };
        if absolute.scheme() != "http" && absolute.scheme() != "https" {
            return raw.to_string();
        }

        if let Some(target) = self.scope.resolve(trimmed, self.base) {
            if self.is_local(&target) {
                let mut relative = self.scope.output_path(&target).relative_to(self.page_path);
                if let Some(fragment) = absolute.fragment() {
                    relative.push('#');
                    relative.push_str(fragment);
                }
                return relative;
            }
        }

        absolute.to_string()
    }

    /// Returns true if `target` gets a document in the output tree
    fn is_local(&self, target: &Url) -> bool {
        match self.local {
            Some(local) => {
                local.contains(target) || self.scope.output_path(target) == *self.page_path
            }
            None => self.scope.admits(target),
        }
    }

    fn src(&self, raw: &str) -> String {
        match self.base.join(raw.trim()) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => raw.to_string(),
        }
    }
}

/// Cleaned HTML plus Markdown blocks rendered ahead of conversion
///
/// Each block stands in `html` as a paragraph holding its [`block_token`].
#[derive(Debug, Default)]
pub(crate) struct Serialized {
    pub html: String,
    pub blocks: Vec<String>,
}

impl Serialized {
    fn push_block(&mut self, block: String) {
        self.html.push_str("<p>");
        self.html.push_str(&block_token(self.blocks.len()));
        self.html.push_str("</p>");
        self.blocks.push(block);
    }
}

/// Placeholder for the `index`th pre-rendered block
pub(crate) fn block_token(index: usize) -> String {
    format!("MDSPIDERBLOCK{}X", index)
}

/// Writes cleaned HTML for selected elements
#[derive(Clone, Copy)]
pub(crate) struct Cleaner<'a> {
    pub ignore: &'a [Selector],
    pub links: LinkRewriter<'a>,

    /// Prepare for Markdown conversion: `<pre>` blocks are flattened to
    /// `<pre><code class="language-..">` so the converter emits a tagged
    /// fence, and tables are rendered as pipe tables
    pub markdown: bool,
}

impl Cleaner<'_> {
    pub fn write(&self, element: ElementRef<'_>, out: &mut Serialized) {
        let name = element.value().name();

        if self.dropped(element) {
            return;
        }

        if self.markdown && name == "pre" {
            if let Some(language) = code_language(element) {
                let html = &mut out.html;
                html.push_str("<pre><code class=\"language-");
                escape_attr(&language, html);
                html.push_str("\">");
                let text: String = element.text().collect();
                escape_text(&text, html);
                html.push_str("</code></pre>");
                return;
            }
        }

        if self.markdown && name == "table" {
            self.write_table(element, out);
            return;
        }

        out.html.push('<');
        out.html.push_str(name);
        for (attr, value) in element.value().attrs() {
            let value = match (name, attr) {
                ("a", "href") => self.links.href(value),
                ("img", "src") => self.links.src(value),
                _ => value.to_string(),
            };
            out.html.push(' ');
            out.html.push_str(attr);
            out.html.push_str("=\"");
            escape_attr(&value, &mut out.html);
            out.html.push('"');
        }
        out.html.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        self.write_children(element, out);

        out.html.push_str("</");
        out.html.push_str(name);
        out.html.push('>');
    }

    fn write_children(&self, element: ElementRef<'_>, out: &mut Serialized) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => escape_text(text, &mut out.html),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.write(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn dropped(&self, element: ElementRef<'_>) -> bool {
        ALWAYS_DROPPED.contains(&element.value().name())
            || self.ignore.iter().any(|s| s.matches(&element))
    }

    fn write_table(&self, table_el: ElementRef<'_>, out: &mut Serialized) {
        match table::layout(table_el) {
            Layout::Plain => {
                for row in table::rows(table_el) {
                    for cell in table::cells(row).into_iter().filter(|c| !self.dropped(*c)) {
                        out.html.push_str("<p>");
                        self.write_children(cell, out);
                        out.html.push_str("</p>");
                    }
                }
            }
            Layout::KeepHtml => {
                let raw = Cleaner {
                    markdown: false,
                    ..*self
                };
                let mut kept = Serialized::default();
                raw.write(table_el, &mut kept);
                out.push_block(kept.html);
            }
            Layout::Grid => {
                let block = self.pipe_table(table_el);
                out.push_block(block);
            }
        }
    }

    fn pipe_table(&self, table_el: ElementRef<'_>) -> String {
        let rows = table::rows(table_el);
        let alignments = table::column_alignments(&rows);
        let separator = table::separator_row(&alignments);

        let mut lines = Vec::new();
        if !rows.first().is_some_and(|row| table::is_header_row(*row)) {
            lines.push(table::blank_header_row(alignments.len()));
            lines.push(separator.clone());
        }

        for row in rows.iter().copied().filter(|r| !self.dropped(*r)) {
            let cells: Vec<String> = table::cells(row)
                .into_iter()
                .filter(|c| !self.dropped(*c))
                .map(|cell| table::format_cell(&self.cell_markdown(cell), table::colspan(cell)))
                .collect();
            lines.push(format!("|{}|", cells.join("|")));
            if table::is_header_row(row) {
                lines.push(separator.clone());
            }
        }

        let mut block = String::new();
        if let Some(caption) = table::caption(table_el) {
            block.push_str(&caption);
            block.push_str("\n\n");
        }
        block.push_str(&lines.join("\n"));
        block
    }

    fn cell_markdown(&self, cell: ElementRef<'_>) -> String {
        let mut inner = Serialized::default();
        self.write_children(cell, &mut inner);
        markdown::html_to_markdown(&inner.html).unwrap_or_else(|_| cell.text().collect())
    }
}

/// Language named by a `language-*` / `lang-*` class or `data-lang` on the
/// block or anything inside it
fn code_language(element: ElementRef<'_>) -> Option<String> {
    std::iter::once(element)
        .chain(element.descendants().filter_map(ElementRef::wrap))
        .find_map(|el| {
            let value = el.value();
            value
                .classes()
                .find_map(|class| {
                    class
                        .strip_prefix("language-")
                        .or_else(|| class.strip_prefix("lang-"))
                })
                .or_else(|| value.attr("data-lang"))
                .map(str::trim)
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
        })
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
