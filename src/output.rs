//! CLI output formatting for the build stages.
//!
//! Output is **information-centric, not file-centric**: documents lead with
//! their title and positional index, with source paths and urls shown as
//! indented context lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Documents
//! 001 Feed
//!     Source: feed.tera
//!     URL: /feed.xml
//! 002 First Light
//!     Source: writings/first-light.md
//!     URL: /writings/first-light/
//!
//! Collections
//! writings (3)
//!     001 Second Wind (Mar 2, 2025)
//!     002 First Light (Jan 15, 2025)
//!     003 Undated Notes
//! works (2)
//!     001 Atlas (2023, featured)
//!     002 Beacon (2024)
//!     Hidden: works/compass.md
//!
//! Passthrough (3 files)
//!     assets/css/site.css
//!     index.html
//! ```
//!
//! ## Build
//!
//! ```text
//! writings/first-light.md → writings/first-light/index.html
//! feed.tera → feed.xml
//!
//! Not written
//!     fragment.md
//!
//! Generated 9 pages, copied 3 files
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::collections::{COLLECTION_NAMES, Collections};
use crate::filters;
use crate::generate::BuildReport;
use crate::scan::Manifest;
use crate::types::Document;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    filters::pad(pos, 3)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Title, falling back to the file slug and then the input path.
fn display_title(doc: &Document) -> &str {
    doc.title
        .as_deref()
        .filter(|t| !t.is_empty())
        .or(Some(doc.file_slug.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or(&doc.input_path)
}

/// Collection member line: index, title, and the field the collection sorts by.
///
/// ```text
/// 001 Second Wind (Mar 2, 2025)
/// 001 Atlas (2023, featured)
/// 003 Undated Notes
/// ```
fn member_line(index: usize, doc: &Document, collection: &str) -> String {
    let detail = if collection == "works" {
        match (doc.year, doc.featured) {
            (Some(y), true) => Some(format!("{y}, featured")),
            (None, true) => Some("featured".to_string()),
            (Some(y), false) => Some(y.to_string()),
            (None, false) => None,
        }
    } else {
        doc.date.as_ref().map(|d| filters::format_date(Some(d)))
    };
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), display_title(doc), d),
        None => format!("{} {}", format_index(index), display_title(doc)),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the discovered inventory and the collections built from it.
pub fn format_scan_output(manifest: &Manifest, collections: &Collections) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];

    for (i, doc) in manifest.documents.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), display_title(doc)));
        lines.push(format!("{}Source: {}", indent(1), doc.input_path));
        match &doc.url {
            Some(url) => lines.push(format!("{}URL: {}", indent(1), url)),
            None => lines.push(format!("{}URL: (not written)", indent(1))),
        }
        if let Some(desc) = doc.data.get("description").and_then(|d| d.as_str()) {
            let plain = filters::strip_html_tags(desc);
            let truncated = truncate_desc(plain.trim(), 60);
            if !truncated.is_empty() {
                lines.push(format!("{}{}", indent(1), truncated));
            }
        }
    }

    lines.push(String::new());
    lines.push("Collections".to_string());
    for name in COLLECTION_NAMES {
        let items = collections.get(name).unwrap_or_default();
        lines.push(format!("{} ({})", name, items.len()));
        for (i, doc) in items.iter().enumerate() {
            lines.push(format!("{}{}", indent(1), member_line(i + 1, doc, name)));
        }
        if *name == "works" {
            for doc in &collections.hidden {
                lines.push(format!("{}Hidden: {}", indent(1), doc.input_path));
            }
        }
    }

    if !manifest.data.is_empty() {
        lines.push(String::new());
        lines.push("Data".to_string());
        for key in manifest.data.keys() {
            lines.push(format!("{}{}", indent(1), key));
        }
    }

    lines.push(String::new());
    lines.push(format!("Passthrough ({} files)", manifest.passthrough.len()));
    for file in &manifest.passthrough {
        lines.push(format!("{}{}", indent(1), file));
    }

    lines
}

pub fn print_scan_output(manifest: &Manifest, collections: &Collections) {
    for line in format_scan_output(manifest, collections) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format what a build wrote.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .map(|(input, output)| format!("{} → {}", input, output))
        .collect();

    if !report.unwritten.is_empty() {
        lines.push(String::new());
        lines.push("Not written".to_string());
        for input in &report.unwritten {
            lines.push(format!("{}{}", indent(1), input));
        }
    }

    lines.push(String::new());
    let page_word = if report.pages.len() == 1 { "page" } else { "pages" };
    let file_word = if report.copied == 1 { "file" } else { "files" };
    lines.push(format!(
        "Generated {} {}, copied {} {}",
        report.pages.len(),
        page_word,
        report.copied,
        file_word
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}
