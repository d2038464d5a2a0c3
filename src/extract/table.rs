//! GitHub-flavoured Markdown tables
//!
//! Tables are laid out here, from the parsed page, before the rest of the
//! document goes through the Markdown converter. A table becomes one of:
//! - plain text, when it has no rows or a single cell
//! - raw HTML, when a cell holds block content a pipe table cannot express
//! - a pipe table with a header separator and per-column alignment

use scraper::ElementRef;

/// Elements that force a table to stay HTML
const BLOCK_ELEMENTS: &[&str] = &[
    "table",
    "pre",
    "code",
    "blockquote",
    "ul",
    "ol",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
];

/// Minimum width of a cell's content
const MIN_CELL_WIDTH: usize = 3;

/// How a table is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Plain,
    KeepHtml,
    Grid,
}

/// Column alignment, as written in the separator row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Alignment {
    Left,
    Right,
    Center,
    Unset,
}

impl Alignment {
    const ALL: [Alignment; 4] = [Self::Left, Self::Right, Self::Center, Self::Unset];

    pub fn marker(&self) -> &'static str {
        match self {
            Self::Left => ":---",
            Self::Right => "---:",
            Self::Center => ":---:",
            Self::Unset => "---",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" => Some(Self::Center),
            "" => Some(Self::Unset),
            _ => None,
        }
    }
}

pub(crate) fn layout(table: ElementRef<'_>) -> Layout {
    let rows = rows(table);
    match rows.as_slice() {
        [] => return Layout::Plain,
        [only] if cells(*only).len() <= 1 => return Layout::Plain,
        _ => {}
    }

    let has_block = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .skip(1)
        .any(|el| BLOCK_ELEMENTS.contains(&el.value().name()));

    if has_block {
        Layout::KeepHtml
    } else {
        Layout::Grid
    }
}

/// Every row of the table, in document order
pub(crate) fn rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .collect()
}

pub(crate) fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

/// A row inside `thead`, or a leading all-`th` row when the table has no `thead`
pub(crate) fn is_header_row(row: ElementRef<'_>) -> bool {
    let Some(parent) = row.parent().and_then(ElementRef::wrap) else {
        return false;
    };

    match parent.value().name() {
        "thead" => true,
        name @ ("table" | "tbody") => {
            let first = parent
                .children()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "tr");
            if first.map(|el| el.id()) != Some(row.id()) {
                return false;
            }

            if name == "tbody" && follows_thead(parent) {
                return false;
            }

            cells(row).iter().all(|cell| cell.value().name() == "th")
        }
        _ => false,
    }
}

fn follows_thead(section: ElementRef<'_>) -> bool {
    section
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "thead")
}

/// Most common alignment of each column
///
/// Cells without any alignment vote for [`Alignment::Unset`]; the first
/// alignment with the most votes wins.
pub(crate) fn column_alignments(rows: &[ElementRef<'_>]) -> Vec<Alignment> {
    let row_cells: Vec<Vec<ElementRef<'_>>> = rows.iter().map(|row| cells(*row)).collect();
    let columns = row_cells.iter().map(Vec::len).max().unwrap_or(0);

    (0..columns)
        .map(|col| {
            let mut votes = [0usize; 4];
            for alignment in row_cells
                .iter()
                .filter_map(|cells| cells.get(col))
                .filter_map(|cell| cell_alignment(*cell))
            {
                votes[alignment as usize] += 1;
            }

            let best = votes.iter().copied().max().unwrap_or(0);
            if best == 0 {
                return Alignment::Unset;
            }
            let index = votes.iter().position(|v| *v == best).unwrap_or(3);
            Alignment::ALL[index]
        })
        .collect()
}

fn cell_alignment(cell: ElementRef<'_>) -> Option<Alignment> {
    let align = cell.value().attr("align").unwrap_or("").trim().to_ascii_lowercase();
    if !align.is_empty() {
        return Alignment::parse(&align);
    }

    let from_style = cell
        .value()
        .attr("style")
        .and_then(style_alignment)
        .unwrap_or(Alignment::Unset);
    Some(from_style)
}

/// Reads `text-align: left|right|center` out of an inline style
fn style_alignment(style: &str) -> Option<Alignment> {
    let style = style.to_ascii_lowercase();
    style.match_indices("text-align").find_map(|(at, key)| {
        let rest = style[at + key.len()..].trim_start().strip_prefix(':')?;
        let value = rest.trim_start();
        ["left", "right", "center"]
            .into_iter()
            .find(|candidate| value.starts_with(candidate))
            .and_then(Alignment::parse)
    })
}

pub(crate) fn separator_row(alignments: &[Alignment]) -> String {
    let markers: Vec<&str> = alignments.iter().map(Alignment::marker).collect();
    format!("|{}|", markers.join("|"))
}

/// Empty header used when the table has none of its own
pub(crate) fn blank_header_row(columns: usize) -> String {
    format!("|{}|", vec!["   "; columns].join("|"))
}

pub(crate) fn colspan(cell: ElementRef<'_>) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Formats converted cell content for a pipe row
pub(crate) fn format_cell(content: &str, colspan: usize) -> String {
    let mut content = escape_pipes(content.replace('\n', " ").trim());

    let width = content.chars().count();
    if width < MIN_CELL_WIDTH {
        content.push_str(&" ".repeat(MIN_CELL_WIDTH - width));
    }

    if colspan > 1 {
        content.push_str(" |");
        content.push_str(&" ".repeat(MIN_CELL_WIDTH * (colspan - 1)));
    }

    format!(" {} ", content)
}

fn escape_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '|' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

pub(crate) fn caption(table: ElementRef<'_>) -> Option<String> {
    let caption = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "caption")?;
    let text: String = caption.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
