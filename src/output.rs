//! CLI output formatting.
//!
//! Logging (`tracing`) reports per-file problems as they happen; this module
//! prints the end-of-run inventory a user reads after `build` or `check`.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Documents
//!     12 published, 2 drafts skipped, 1 failed
//!     Languages: en, ru
//! Assets
//!     40 copied
//!     3 message files (57 messages)
//! Rendered
//!     12 pages
//!     2 templates (index.html, index_ru.html)
//!     1 page failed
//! Thumbnails
//!     10 created, 0 failed, 3 duplicate references
//! Search index
//!     search/en.json
//!     search/ru.json
//! Tags
//!     rust      5
//!     web       2
//! ```
//!
//! ## Check
//!
//! Same `Documents` and `Tags` sections, plus the number of standalone
//! templates that a build would render.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{BuildSummary, CheckSummary, ParseStats};
use crate::tags::TagCount;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn document_lines(stats: &ParseStats, languages: &[String]) -> Vec<String> {
    let mut parts = vec![format!("{} published", stats.documents)];
    if stats.drafts > 0 {
        parts.push(plural(stats.drafts, "draft skipped", "drafts skipped"));
    }
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed));
    }
    let mut lines = vec![
        "Documents".to_string(),
        format!("{}{}", indent(1), parts.join(", ")),
    ];
    if !languages.is_empty() {
        lines.push(format!("{}Languages: {}", indent(1), languages.join(", ")));
    }
    lines
}

/// Tag table, names padded to a common width.
pub fn format_tag_stats(tags: &[TagCount]) -> Vec<String> {
    if tags.is_empty() {
        return Vec::new();
    }
    let width = tags.iter().map(|t| t.tag.chars().count()).max().unwrap_or(0);
    let mut lines = vec!["Tags".to_string()];
    lines.extend(tags.iter().map(|t| {
        let pad = width - t.tag.chars().count();
        format!("{}{}{} {}", indent(1), t.tag, " ".repeat(pad), t.count)
    }));
    lines
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(summary: &BuildSummary, output_dir: &Path) -> Vec<String> {
    let mut lines = document_lines(&summary.parse, &summary.languages);

    lines.push("Assets".to_string());
    lines.push(format!("{}{} copied", indent(1), summary.parse.assets));
    if summary.parse.bundles > 0 {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            plural(summary.parse.bundles, "message file", "message files"),
            plural(summary.messages, "message", "messages"),
        ));
    }

    lines.push("Rendered".to_string());
    lines.push(format!(
        "{}{}",
        indent(1),
        plural(summary.pages.rendered.len(), "page", "pages")
    ));
    if !summary.templates.rendered.is_empty() {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            plural(summary.templates.rendered.len(), "template", "templates"),
            summary.templates.rendered.join(", ")
        ));
    }
    let failed = summary.pages.failed + summary.templates.failed;
    if failed > 0 {
        lines.push(format!(
            "{}{} failed",
            indent(1),
            plural(failed, "page", "pages")
        ));
    }

    lines.push("Thumbnails".to_string());
    lines.push(format!("{}{}", indent(1), summary.thumbnails));

    if !summary.search_files.is_empty() {
        lines.push("Search index".to_string());
        for file in &summary.search_files {
            let shown = file.strip_prefix(output_dir).unwrap_or(file);
            lines.push(format!("{}{}", indent(1), shown.display()));
        }
    }

    lines.extend(format_tag_stats(&summary.tags));
    lines
}

pub fn print_build_output(summary: &BuildSummary, output_dir: &Path) {
    for line in format_build_output(summary, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(summary: &CheckSummary) -> Vec<String> {
    let mut lines = document_lines(&summary.parse, &summary.languages);
    lines.push("Sources".to_string());
    lines.push(format!(
        "{}{}, {}",
        indent(1),
        plural(summary.parse.assets, "asset", "assets"),
        plural(summary.parse.bundles, "message file", "message files"),
    ));
    lines.push(format!(
        "{}{}",
        indent(1),
        plural(
            summary.standalone_templates,
            "standalone template group",
            "standalone template groups"
        )
    ));
    lines.extend(format_tag_stats(&summary.tags));
    lines
}

pub fn print_check_output(summary: &CheckSummary) {
    for line in format_check_output(summary) {
        println!("{}", line);
    }
}
