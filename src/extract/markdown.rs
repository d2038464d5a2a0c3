use super::serialize::{block_token, Serialized};
use crate::extract::ExtractError;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;

/// Converts serializer output to Markdown, splicing in its rendered blocks
pub(crate) fn render(serialized: &Serialized) -> Result<String, ExtractError> {
    let markdown = convert(&serialized.html)?;
    if serialized.blocks.is_empty() {
        return Ok(tidy(&markdown));
    }
    Ok(tidy(&splice_blocks(&markdown, &serialized.blocks)))
}

/// Converts cleaned HTML to Markdown
///
/// ATX headings, `-` bullets and fenced code blocks; the result goes through
/// [`tidy`] so the same input always yields the same bytes.
pub(crate) fn html_to_markdown(html: &str) -> Result<String, ExtractError> {
    Ok(tidy(&convert(html)?))
}

fn convert(html: &str) -> Result<String, ExtractError> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style"])
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .build();

    converter
        .convert(html)
        .map_err(|e| ExtractError::Conversion(e.to_string()))
}

/// Replaces block tokens with their blocks, each set off by blank lines
fn splice_blocks(markdown: &str, blocks: &[String]) -> String {
    let mut out = String::with_capacity(markdown.len() + blocks.iter().map(String::len).sum::<usize>());
    for line in markdown.lines() {
        let mut line = line.to_string();
        for (i, block) in blocks.iter().enumerate() {
            let token = block_token(i);
            if line.contains(&token) {
                line = line.replace(&token, &format!("\n\n{}\n\n", block));
            }
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Normalizes converter output
///
/// - adjacent fenced code blocks are separated by a blank line
/// - runs of blank lines outside code blocks collapse to one
/// - trailing whitespace on the document is trimmed, ending in one newline
pub(crate) fn tidy(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut last_closed_fence = false;

    for line in markdown.lines() {
        let is_fence = line.trim_start().starts_with("```");

        if in_fence {
            lines.push(line);
            if is_fence {
                in_fence = false;
                last_closed_fence = true;
            }
            continue;
        }

        if is_fence {
            if last_closed_fence {
                lines.push("");
            }
            in_fence = true;
            last_closed_fence = false;
            lines.push(line);
            continue;
        }

        let blank = line.trim().is_empty();
        if blank {
            if lines.last().map_or(true, |prev| prev.is_empty()) {
                continue;
            }
            lines.push("");
        } else {
            lines.push(line.trim_end());
        }
        last_closed_fence = false;
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
