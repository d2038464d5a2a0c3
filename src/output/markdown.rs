//! Markdown summary generation
//!
//! Writes a human-readable report of a run next to the crawled content when
//! `summary-path` is configured.

use crate::output::stats::CrawlSummary;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Longest failure and skip lists included in the report
const MAX_LISTED: usize = 100;

/// Writes a markdown summary of the run
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn write_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Markdown Spider Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration.as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Status**: {}\n\n",
        if summary.stopped { "stopped" } else { "completed" }
    ));

    md.push_str("## Results\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Succeeded | {} |\n", summary.succeeded));
    md.push_str(&format!("| Failed | {} |\n", summary.failed));
    md.push_str(&format!("| Skipped | {} |\n", summary.skipped));
    md.push_str(&format!("| Not processed | {} |\n", summary.unfinished));
    md.push_str(&format!("| Files written | {} |\n\n", summary.pages_written));
    md.push_str(&format!(
        "Success rate: {:.2}%\n\n",
        summary.success_rate()
    ));

    push_url_table(&mut md, "Failures", &summary.failures);
    push_url_table(&mut md, "Skipped Pages", &summary.skips);

    md
}

fn push_url_table(md: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    md.push_str("| URL | Reason |\n");
    md.push_str("|-----|--------|\n");
    for (url, reason) in rows.iter().take(MAX_LISTED) {
        md.push_str(&format!("| {} | {} |\n", url, reason.replace('|', "\\|")));
    }
    if rows.len() > MAX_LISTED {
        md.push_str(&format!("\n... and {} more\n", rows.len() - MAX_LISTED));
    }
    md.push('\n');
}
