//! Plain-text summary table for terminals
//!
//! One line per participant: right-aligned minute columns for each period
//! and the total, then the participant name. Dashed rules frame the rows and
//! a final line carries the per-period totals for the whole class.

use crate::aggregate::AttendanceTable;
use crate::pipeline::AttendanceReport;
use std::fmt::Write;

const MIN_COLUMN_WIDTH: usize = 6;

fn column_width(label: &str) -> usize {
    label.chars().count().max(MIN_COLUMN_WIDTH)
}

fn rule(widths: &[usize]) -> String {
    let mut line: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    line.push("-".repeat(16));
    line.join(" ")
}

/// Render the table portion only
pub fn render_table(table: &AttendanceTable) -> String {
    let mut out = String::new();
    if table.is_empty() {
        out.push_str("No participants found.\n");
        return out;
    }

    let mut labels: Vec<&str> = table.period_labels.iter().map(String::as_str).collect();
    labels.push("total");
    let widths: Vec<usize> = labels.iter().map(|l| column_width(l)).collect();

    let header: Vec<String> = labels
        .iter()
        .zip(&widths)
        .map(|(label, &w)| format!("{:>w$}", label, w = w))
        .collect();
    let _ = writeln!(out, "{} participant", header.join(" "));
    let _ = writeln!(out, "{}", rule(&widths));

    let mut period_totals = vec![0u64; table.period_labels.len()];
    for row in &table.rows {
        let mut cells: Vec<String> = row
            .periods
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(idx, (period, &w))| {
                period_totals[idx] = period_totals[idx].saturating_add(period.minutes);
                format!("{:>w$}", period.minutes, w = w)
            })
            .collect();
        cells.push(format!(
            "{:>w$}",
            row.total_minutes,
            w = widths[widths.len() - 1]
        ));
        let _ = writeln!(out, "{} {}", cells.join(" "), row.identity);
    }

    let _ = writeln!(out, "{}", rule(&widths));
    let mut totals: Vec<String> = period_totals
        .iter()
        .zip(&widths)
        .map(|(minutes, &w)| format!("{:>w$}", minutes, w = w))
        .collect();
    totals.push(format!(
        "{:>w$}",
        table.grand_total(),
        w = widths[widths.len() - 1]
    ));
    let _ = writeln!(out, "{} total", totals.join(" "));

    out
}

/// Render the table followed by a one-line run summary
pub fn render_report(report: &AttendanceReport) -> String {
    let mut out = render_table(&report.table);
    let stats = &report.stats;
    let _ = writeln!(
        out,
        "\n{} participants from {} rows (policy: {}, unparseable timestamps: {}, clamped intervals: {})",
        report.table.len(),
        stats.rows_read,
        report.policy,
        stats.unparseable_timestamps,
        stats.clamped_intervals
    );
    out
}
