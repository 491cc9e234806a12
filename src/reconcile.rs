//! Duration reconciliation
//!
//! Turns the typed rows of one export into one [`ReconciledAttendance`] per
//! participant identity. A participant may own many rows (reconnects,
//! renamed devices), so each period's minutes are derived under exactly one
//! explicit [`Policy`]:
//!
//! - [`Policy::Span`]: latest end minus earliest start over complete
//!   intervals, gaps ignored
//! - [`Policy::Sum`]: every row's own interval summed, overlaps counted twice
//! - [`Policy::PassThrough`]: the export's own minute column summed
//!
//! Under every policy minutes are truncated, never negative, and a period
//! with no usable interval is 0 rather than absent.

use crate::ingest::{IngestStats, PeriodInterval, RawAttendanceRow};
use crate::timestamp::whole_minutes;
use chrono::NaiveDateTime;
use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How per-period minutes are derived from a participant's rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Outer envelope: earliest start to latest end
    Span,
    /// Sum of every connection's own interval (no dedup)
    #[default]
    Sum,
    /// Trust the export's precomputed duration column
    PassThrough,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Span => "span",
            Self::Sum => "sum",
            Self::PassThrough => "pass-through",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One period of one participant after reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciledPeriod {
    pub minutes: u64,
    /// Earliest start seen across the participant's rows (display only)
    pub first_start: Option<NaiveDateTime>,
    /// Latest end seen across the participant's rows (display only)
    pub last_end: Option<NaiveDateTime>,
}

impl ReconciledPeriod {
    /// Widen the display envelope with one interval's present bounds
    fn observe(&mut self, interval: &PeriodInterval) {
        if let Some(start) = interval.start {
            self.first_start = Some(self.first_start.map_or(start, |s| s.min(start)));
        }
        if let Some(end) = interval.end {
            self.last_end = Some(self.last_end.map_or(end, |e| e.max(end)));
        }
    }
}

/// Per-period result for one participant identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledAttendance {
    pub identity: String,
    pub periods: Vec<ReconciledPeriod>,
    /// Number of input rows merged into this identity
    pub source_rows: usize,
}

impl ReconciledAttendance {
    pub fn minutes(&self) -> Vec<u64> {
        self.periods.iter().map(|p| p.minutes).collect()
    }
}

/// Minutes for one interval, counting it when the bounds are reversed
fn interval_minutes(
    start: NaiveDateTime,
    end: NaiveDateTime,
    line: u64,
    stats: &mut IngestStats,
) -> u64 {
    if end < start {
        stats.clamped_intervals += 1;
        debug!(line, %start, %end, "leave precedes join, counted as 0 minutes");
    }
    whole_minutes(start, end)
}

/// Reconcile rows into one entry per identity, in first-seen order
///
/// `period_count` fixes the number of output periods; rows carrying fewer
/// intervals leave the remaining periods at zero.
pub fn reconcile(
    rows: &[RawAttendanceRow],
    period_count: usize,
    policy: Policy,
    stats: &mut IngestStats,
) -> Vec<ReconciledAttendance> {
    let mut grouped: IndexMap<&str, Vec<&RawAttendanceRow>> = IndexMap::new();
    for row in rows {
        grouped.entry(row.identity.as_str()).or_default().push(row);
    }

    stats.identities = grouped.len() as u64;
    debug!(
        identities = grouped.len(),
        rows = rows.len(),
        %policy,
        "grouped rows by identity"
    );

    grouped
        .into_iter()
        .map(|(identity, group)| {
            let periods = (0..period_count)
                .map(|idx| reconcile_period(&group, idx, policy, stats))
                .collect();
            ReconciledAttendance {
                identity: identity.to_string(),
                periods,
                source_rows: group.len(),
            }
        })
        .collect()
}

/// Derive one period of one identity from all of its rows
fn reconcile_period(
    group: &[&RawAttendanceRow],
    idx: usize,
    policy: Policy,
    stats: &mut IngestStats,
) -> ReconciledPeriod {
    let mut period = ReconciledPeriod::default();
    let intervals = group
        .iter()
        .filter_map(|row| row.intervals.get(idx).map(|interval| (row.line, interval)));

    match policy {
        Policy::Span => {
            // Only complete intervals stretch the envelope
            let mut envelope: Option<(NaiveDateTime, NaiveDateTime, u64)> = None;
            for (line, interval) in intervals {
                period.observe(interval);
                if let Some((start, end)) = interval.bounds() {
                    envelope = Some(match envelope {
                        Some((s, e, l)) => (s.min(start), e.max(end), l),
                        None => (start, end, line),
                    });
                }
            }
            if let Some((start, end, line)) = envelope {
                period.minutes = interval_minutes(start, end, line, stats);
            }
        }
        Policy::Sum => {
            for (line, interval) in intervals {
                period.observe(interval);
                if let Some((start, end)) = interval.bounds() {
                    period.minutes = period
                        .minutes
                        .saturating_add(interval_minutes(start, end, line, stats));
                }
            }
        }
        Policy::PassThrough => {
            for (_, interval) in intervals {
                period.observe(interval);
            }
            // The export's single connection column maps onto the first period
            if idx == 0 {
                period.minutes = group
                    .iter()
                    .filter_map(|row| row.reported_minutes)
                    .fold(0u64, u64::saturating_add);
            }
        }
    }

    period
}
