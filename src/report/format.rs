//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{AvailableColumn, ColumnSelector, FileFailure, FileReport, WeeklyPoint};

/// Number of weekly points shown in the summary preview.
pub const PREVIEW_ROWS: usize = 5;

/// Format the run summary (dataset, column, counts, year range).
pub fn format_run_summary(run: &RunOutput, tag: &str, years: u32) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== pollen - weekly {} ({tag}) ===\n", run.column.name));
    out.push_str(&format!("Column: {} (index {})\n", run.column.name, run.column.index));
    out.push_str(&format!(
        "Files: matched={} | read={} | failed={}\n",
        run.files_matched,
        run.file_reports.len(),
        run.file_failures.len()
    ));

    let dropped: usize = run.file_reports.iter().map(|r| r.rows_dropped).sum();
    out.push_str(&format!("Total records: {} | rows dropped: {dropped}\n", run.record_count));
    out.push_str(&format!(
        "Year range: {} - {} (last {years} year(s))\n",
        run.year_range.0, run.year_range.1
    ));
    out.push_str(&format!(
        "Weekly points: {} | samples in window: {}\n",
        run.series.len(),
        run.series.total_samples()
    ));
    out.push('\n');

    out
}

/// Format the first weekly points as a small table.
pub fn format_series_preview(points: &[WeeklyPoint], n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>12} {:>6}\n", "week_start", "mean", "n"));
    out.push_str(&format!("{:-<12} {:-<12} {:-<6}\n", "", "", ""));
    for p in points.iter().take(n) {
        out.push_str(&format!(
            "{:<12} {:>12.3} {:>6}\n",
            p.week_start.to_string(),
            p.mean_value,
            p.sample_count
        ));
    }
    if points.len() > n {
        out.push_str(&format!("... {} more\n", points.len() - n));
    }
    out
}

/// Format per-file provenance and failures.
pub fn format_file_report(reports: &[FileReport], failures: &[FileFailure]) -> String {
    let mut out = String::new();
    out.push_str("Files:\n");
    for r in reports {
        out.push_str(&format!(
            "  {:<40} rows={:<6} kept={:<6} dropped={}\n",
            truncate(&r.file_id, 40),
            r.rows_read,
            r.records_kept,
            r.rows_dropped
        ));
    }
    if !failures.is_empty() {
        out.push_str("Failed files:\n");
        for f in failures {
            out.push_str(&format!("  {}: {}\n", f.file_id, f.reason));
        }
    }
    out
}

/// Numbered list of selectable columns, with an example invocation.
pub fn format_available_columns(
    available: &[AvailableColumn],
    attempted: Option<&ColumnSelector>,
    data_dir: &str,
    tag: &str,
) -> String {
    let mut out = String::new();
    if let Some(selector) = attempted {
        out.push_str(&format!("Column {selector} was not found.\n"));
    }
    if available.is_empty() {
        out.push_str("No columns found.\n");
        return out;
    }

    out.push_str("Available columns:\n");
    for (n, c) in available.iter().enumerate() {
        out.push_str(&format!("  {:>2}. {} (index: {})\n", n + 1, c.name, c.index));
    }
    out.push_str("\nSelect one with -a/--column (name or index).\n");
    out.push_str(&format!(
        "Example: pollen plot {data_dir} -c {tag} -a '{}'\n",
        available[0].name
    ));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
