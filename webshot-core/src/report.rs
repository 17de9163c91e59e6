// Report generation from crawl results

use crate::crawl::{extract_url_host, extract_url_path};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use webshot_spider::{CrawlResults, VisitStatus};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

const STATUS_ORDER: [VisitStatus; 5] = [
    VisitStatus::Visited,
    VisitStatus::Redirected,
    VisitStatus::Excluded,
    VisitStatus::Error,
    VisitStatus::Unvisited,
];

/// Group addresses by host; anything without a host lands under "(other)"
fn group_by_host(results: &CrawlResults) -> BTreeMap<String, Vec<(&str, VisitStatus)>> {
    let mut by_host: BTreeMap<String, Vec<(&str, VisitStatus)>> = BTreeMap::new();
    for (address, status) in &results.status_by_address {
        let host = extract_url_host(address).unwrap_or_else(|| "(other)".to_string());
        by_host
            .entry(host)
            .or_default()
            .push((address.as_str(), *status));
    }
    by_host
}

fn status_label(status: VisitStatus, colorize: bool) -> String {
    let label = match status {
        VisitStatus::Visited => "✓ visited   ",
        VisitStatus::Redirected => "↪ redirected",
        VisitStatus::Excluded => "- excluded  ",
        VisitStatus::Error => "✗ error     ",
        VisitStatus::Unvisited => "? unvisited ",
    };
    if !colorize {
        return label.to_string();
    }
    match status {
        VisitStatus::Visited => label.green(),
        VisitStatus::Redirected => label.cyan(),
        VisitStatus::Excluded => label.bright_black(),
        VisitStatus::Error => label.red(),
        VisitStatus::Unvisited => label.white(),
    }
    .to_string()
}

/// Render `results` in `format`. `colorize` only affects the text format;
/// pass `false` for anything that is not going straight to a terminal.
pub fn generate_report(
    results: &CrawlResults,
    format: ReportFormat,
    colorize: bool,
) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(results, colorize)),
        ReportFormat::Markdown => Ok(generate_markdown_report(results)),
        ReportFormat::Json => serde_json::to_string_pretty(results)
            .map_err(|e| format!("Failed to serialize results: {}", e)),
    }
}

/// Terminal report: summary, pages grouped by host, then broken links
pub fn generate_text_report(results: &CrawlResults, colorize: bool) -> String {
    let mut report = String::new();
    report.push_str(DIVIDER);
    report.push_str("\n\n# Summary:\n");
    report.push_str(&format!("  Addresses discovered: {}\n", results.len()));
    for status in STATUS_ORDER {
        let count = results.count(status);
        if count > 0 || status != VisitStatus::Unvisited {
            report.push_str(&format!("  {}: {}\n", capitalize(status.as_str()), count));
        }
    }
    report.push_str(&format!("  Broken links: {}\n", results.broken_links.len()));
    report.push_str(&format!(
        "  Crawled at: {}\n",
        results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push('\n');
    report.push_str(DIVIDER);
    report.push_str("\n\n");

    for (host, entries) in group_by_host(results) {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} addresses\n\n", entries.len()));
        for (address, status) in entries {
            let shown = if host == "(other)" {
                address.to_string()
            } else {
                extract_url_path(address)
            };
            report.push_str(&format!("  {} {}\n", status_label(status, colorize), shown));
        }
        report.push('\n');
    }

    if !results.broken_links.is_empty() {
        report.push_str(DIVIDER);
        report.push_str("\n\n# Broken links:\n");
        for broken in &results.broken_links {
            if colorize {
                report.push_str(&format!("\n  {} {}\n", "✗".red().bold(), broken.target));
                report.push_str(&format!("    {}\n", broken.error.bright_black()));
            } else {
                report.push_str(&format!("\n  ✗ {}\n", broken.target));
                report.push_str(&format!("    {}\n", broken.error));
            }
            if broken.sources.is_empty() {
                report.push_str("    (seed address)\n");
            }
            for source in &broken.sources {
                report.push_str(&format!(
                    "    ← {} (href \"{}\")\n",
                    source.calling_page, source.raw_href
                ));
            }
        }
    }

    report
}

pub fn generate_markdown_report(results: &CrawlResults) -> String {
    let mut report = String::new();
    report.push_str("# Crawl Report\n\n");
    report.push_str(&format!(
        "_Crawled at {}_\n\n",
        results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("## Summary\n\n| Status | Count |\n|---|---|\n");
    for status in STATUS_ORDER {
        report.push_str(&format!("| {} | {} |\n", status.as_str(), results.count(status)));
    }
    report.push_str(&format!("| broken links | {} |\n\n", results.broken_links.len()));

    report.push_str("## Addresses\n\n");
    for (host, entries) in group_by_host(results) {
        report.push_str(&format!("### {}\n\n| Status | Address |\n|---|---|\n", host));
        for (address, status) in entries {
            report.push_str(&format!("| {} | `{}` |\n", status.as_str(), address));
        }
        report.push('\n');
    }

    if !results.broken_links.is_empty() {
        report.push_str("## Broken links\n\n");
        for broken in &results.broken_links {
            report.push_str(&format!("- `{}`: {}\n", broken.target, broken.error));
            for source in &broken.sources {
                report.push_str(&format!("  - linked from `{}`\n", source.calling_page));
            }
        }
    }

    report
}

/// Save a rendered report, creating parent directories as needed
pub fn write_report(path: &Path, content: &str) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    fs::write(path, content).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
