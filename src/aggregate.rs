//! Totals and final table assembly
//!
//! The column order produced here is the user-facing contract of every
//! output format: identity, per-period minutes, per-period start/end, total.

use crate::ingest::ColumnLayout;
use crate::reconcile::{ReconciledAttendance, ReconciledPeriod};
use crate::timestamp::format_minute;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output row ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    /// Order in which each identity first appears in the input
    #[default]
    FirstSeen,
    /// Sorted by identity
    Alphabetical,
}

/// Sum of per-period minutes
pub fn total(periods: &[u64]) -> u64 {
    periods.iter().fold(0u64, |acc, &m| acc.saturating_add(m))
}

/// One participant's final row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    pub identity: String,
    pub periods: Vec<ReconciledPeriod>,
    pub total_minutes: u64,
    /// Input rows merged into this participant
    pub connections: usize,
}

impl AttendanceRow {
    fn from_reconciled(attendance: ReconciledAttendance) -> Self {
        let total_minutes = total(&attendance.minutes());
        Self {
            identity: attendance.identity,
            periods: attendance.periods,
            total_minutes,
            connections: attendance.source_rows,
        }
    }

    /// Cell values in header order; absent timestamps render empty
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(2 + self.periods.len() * 3);
        cells.push(self.identity.clone());
        cells.extend(self.periods.iter().map(|p| p.minutes.to_string()));
        for period in &self.periods {
            cells.push(period.first_start.as_ref().map(format_minute).unwrap_or_default());
            cells.push(period.last_end.as_ref().map(format_minute).unwrap_or_default());
        }
        cells.push(self.total_minutes.to_string());
        cells
    }
}

/// Header plus rows, ready for any renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceTable {
    pub header: Vec<String>,
    /// Period labels in layout order
    pub period_labels: Vec<String>,
    pub rows: Vec<AttendanceRow>,
}

impl AttendanceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sum of every row's total
    pub fn grand_total(&self) -> u64 {
        total(&self.rows.iter().map(|r| r.total_minutes).collect::<Vec<_>>())
    }
}

/// Fixed output header for a layout
pub fn header(layout: &ColumnLayout) -> Vec<String> {
    let mut header = vec![layout.name_column.clone()];
    header.extend(layout.periods.iter().map(|p| p.duration_header.clone()));
    for period in &layout.periods {
        header.push(period.start_column.clone());
        header.push(period.end_column.clone());
    }
    header.push(layout.total_header.clone());
    header
}

/// Attach totals, apply ordering and pair rows with the header
pub fn assemble(
    reconciled: Vec<ReconciledAttendance>,
    layout: &ColumnLayout,
    order: RowOrder,
) -> AttendanceTable {
    let mut rows: Vec<AttendanceRow> = reconciled
        .into_iter()
        .map(AttendanceRow::from_reconciled)
        .collect();

    if order == RowOrder::Alphabetical {
        rows.sort_by(|a, b| a.identity.cmp(&b.identity));
    }

    AttendanceTable {
        header: header(layout),
        period_labels: layout.periods.iter().map(|p| p.label.clone()).collect(),
        rows,
    }
}
