//! CLI output formatting for `build` and `check`.
//!
//! Output is **record-centric**: every line leads with the record's label
//! (its cite key, or `#N (title)` for list and table rows) so problems can be
//! traced back to the input. File names come second, after an arrow.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Publications → ../_publications
//! 001 #1 (Paper Title Number 1) → 2009-10-01-paper-title-number-1.md
//! 002 vanaken2017 → 2017-Automatic-DBMS-Tuning.md
//!
//! Skipped
//! 001 #3 (Untitled draft)
//!     missing required field `venue`
//!
//! Collisions
//! 001 2020-same.md
//!     #4 (First), #5 (Second)
//!     kept: #5 (Second)
//!
//! Wrote 2 pages, skipped 1 record, 1 collision
//! ```
//!
//! ## Check
//!
//! Same sections, without the output directory, ending in
//! `Would write 2 pages, ...`.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::pipeline::{BuildReport, Collision, Plan, SkippedRecord};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`, `0 pages`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// `001 label → file.md`
fn page_line(index: usize, label: &str, filename: &str) -> String {
    format!("{} {} \u{2192} {}", format_index(index), label, filename)
}

fn skipped_section(skipped: &[SkippedRecord], lines: &mut Vec<String>) {
    if skipped.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Skipped".to_string());
    for (i, record) in skipped.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), record.label));
        lines.push(format!("{}{}", indent(1), record.error));
    }
}

fn collisions_section(collisions: &[Collision], lines: &mut Vec<String>) {
    if collisions.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Collisions".to_string());
    for (i, collision) in collisions.iter().enumerate() {
        lines.push(format!(
            "{} {}.md",
            format_index(i + 1),
            collision.identifier
        ));
        lines.push(format!("{}{}", indent(1), collision.labels.join(", ")));
        if let Some(kept) = collision.labels.last() {
            lines.push(format!("{}kept: {}", indent(1), kept));
        }
    }
}

fn summary(verb: &str, pages: usize, skipped: usize, collisions: usize) -> String {
    format!(
        "{} {}, skipped {}, {}",
        verb,
        count(pages, "page", "pages"),
        count(skipped, "record", "records"),
        count(collisions, "collision", "collisions")
    )
}

// ============================================================================
// Build output
// ============================================================================

/// Format the result of a `build` run.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Publications \u{2192} {}",
        report.output_dir.display()
    )];

    for (i, page) in report.written.iter().enumerate() {
        let filename = page
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| page.path.display().to_string());
        lines.push(page_line(i + 1, &page.label, &filename));
    }

    skipped_section(&report.skipped, &mut lines);
    collisions_section(&report.collisions, &mut lines);

    lines.push(String::new());
    lines.push(summary(
        "Wrote",
        report.written.len(),
        report.skipped.len(),
        report.collisions.len(),
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format a plan produced by `check`. Nothing has been written.
pub fn format_check_output(plan: &Plan) -> Vec<String> {
    let mut lines = vec!["Publications".to_string()];

    for (i, planned) in plan.pages.iter().enumerate() {
        lines.push(page_line(i + 1, &planned.label, &planned.page.filename()));
    }

    skipped_section(&plan.skipped, &mut lines);
    collisions_section(&plan.collisions, &mut lines);

    lines.push(String::new());
    lines.push(summary(
        "Would write",
        plan.pages.len(),
        plan.skipped.len(),
        plan.collisions.len(),
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(plan: &Plan) {
    for line in format_check_output(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
