//! CSV ingestion into typed attendance rows
//!
//! The header is validated once against a [`ColumnLayout`]; every record is
//! then converted into a [`RawAttendanceRow`] with normalized identity and
//! parsed interval bounds. Only a missing column aborts. Bad cells degrade
//! to absent values and are tallied in [`IngestStats`].

use crate::error::{ReconcileError, Result};
use crate::name::normalize_field;
use crate::timestamp::TimestampParser;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Input and output column names for one period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodColumns {
    /// Short period name used in JSON and text output
    pub label: String,
    /// Output header for the period's minute count
    pub duration_header: String,
    pub start_column: String,
    pub end_column: String,
}

/// Resolved column names for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name_column: String,
    pub periods: Vec<PeriodColumns>,
    /// Precomputed minutes column, present only for the pass-through layout
    pub duration_column: Option<String>,
    pub total_header: String,
}

impl ColumnLayout {
    /// Every column the input header must contain
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.name_column.as_str()];
        for period in &self.periods {
            columns.push(period.start_column.as_str());
            columns.push(period.end_column.as_str());
        }
        if let Some(duration) = &self.duration_column {
            columns.push(duration.as_str());
        }
        columns
    }
}

/// Join/leave bounds for one period of one row; either may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodInterval {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl PeriodInterval {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Both bounds, when both parsed
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.start?, self.end?))
    }
}

/// One connection record from the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttendanceRow {
    /// 1-based line in the source file (header is line 1)
    pub line: u64,
    pub identity: String,
    /// One entry per configured period, in layout order
    pub intervals: Vec<PeriodInterval>,
    /// Minutes supplied by the export (pass-through layout only)
    pub reported_minutes: Option<u64>,
}

/// Counters describing what ingestion and reconciliation absorbed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Data records read (header excluded)
    pub rows_read: u64,
    /// Distinct identities after normalization
    pub identities: u64,
    /// Timestamp cells with text no known format accepts
    pub unparseable_timestamps: u64,
    /// Duration cells that are not a number
    pub unparseable_durations: u64,
    /// Intervals or reported durations below zero, counted as 0
    pub clamped_intervals: u64,
}

/// Rows plus the counters gathered while reading them
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub rows: Vec<RawAttendanceRow>,
    pub stats: IngestStats,
}

/// Header positions for the layout's columns
struct ColumnIndex {
    name: usize,
    periods: Vec<(usize, usize)>,
    duration: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, layout: &ColumnLayout) -> Result<Self> {
        let mut missing = Vec::new();
        let mut find = |column: &str| -> usize {
            match headers.iter().position(|h| h.trim() == column) {
                Some(idx) => idx,
                None => {
                    missing.push(column.to_string());
                    usize::MAX
                }
            }
        };

        let name = find(&layout.name_column);
        let periods = layout
            .periods
            .iter()
            .map(|p| (find(&p.start_column), find(&p.end_column)))
            .collect();
        let duration = layout.duration_column.as_deref().map(&mut find);

        if !missing.is_empty() {
            return Err(ReconcileError::Schema { missing });
        }

        Ok(Self {
            name,
            periods,
            duration,
        })
    }
}

/// Strip a leading UTF-8 byte-order mark
fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Parse a precomputed minute count; fractions truncate, negatives clamp
fn parse_reported_minutes(raw: &str, stats: &mut IngestStats) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value.trunc() as u64),
        Ok(value) if value.is_finite() => {
            stats.clamped_intervals += 1;
            debug!(value, "negative reported duration clamped to 0");
            Some(0)
        }
        _ => {
            stats.unparseable_durations += 1;
            debug!(value = trimmed, "unparseable reported duration");
            None
        }
    }
}

fn parse_bound(
    parser: &TimestampParser,
    raw: Option<&str>,
    line: u64,
    column: &str,
    stats: &mut IngestStats,
) -> Option<NaiveDateTime> {
    match parser.parse(raw.unwrap_or_default()) {
        Ok(instant) => Some(instant),
        Err(err) => {
            if err.is_unrecognised() {
                stats.unparseable_timestamps += 1;
                debug!(line, column, %err, "timestamp treated as absent");
            }
            None
        }
    }
}

/// Read every record of `bytes` into typed rows
///
/// Fails only on a missing column or a structurally broken CSV stream.
pub fn read_rows(
    bytes: &[u8],
    layout: &ColumnLayout,
    parser: &TimestampParser,
) -> Result<Ingested> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(bytes));

    let headers = reader.headers()?.clone();
    let index = ColumnIndex::resolve(&headers, layout)?;

    let mut ingested = Ingested::default();
    let stats = &mut ingested.stats;

    for (offset, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(offset as u64 + 2);

        let identity = normalize_field(record.get(index.name));

        let intervals = index
            .periods
            .iter()
            .zip(&layout.periods)
            .map(|(&(start_idx, end_idx), columns)| {
                let start = parse_bound(
                    parser,
                    record.get(start_idx),
                    line,
                    &columns.start_column,
                    stats,
                );
                let end = parse_bound(parser, record.get(end_idx), line, &columns.end_column, stats);
                PeriodInterval::new(start, end)
            })
            .collect();

        let reported_minutes = index
            .duration
            .and_then(|idx| parse_reported_minutes(record.get(idx).unwrap_or_default(), stats));

        stats.rows_read += 1;
        ingested.rows.push(RawAttendanceRow {
            line,
            identity,
            intervals,
            reported_minutes,
        });
    }

    info!(
        rows = ingested.stats.rows_read,
        unparseable_timestamps = ingested.stats.unparseable_timestamps,
        "ingested attendance export"
    );

    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileConfig;
    use crate::reconcile::Policy;

    fn period_layout() -> ColumnLayout {
        ReconcileConfig::default().layout(Policy::Sum)
    }

    #[test]
    fn test_required_columns_period_layout() {
        let layout = period_layout();
        let required = layout.required_columns();
        assert_eq!(required.len(), 9);
        assert_eq!(required[0], "이름(원래 이름)");
        assert_eq!(required[1], "1차시 시작");
        assert_eq!(required[8], "4차시 종료");
    }

    #[test]
    fn test_missing_name_column_is_schema_error() {
        let layout = period_layout();
        let csv = "1차시 시작,1차시 종료,2차시 시작,2차시 종료,3차시 시작,3차시 종료,4차시 시작,4차시 종료\n";
        let err = read_rows(csv.as_bytes(), &layout, &TimestampParser::default()).unwrap_err();
        assert_eq!(err.missing_columns(), ["이름(원래 이름)".to_string()]);
    }

    #[test]
    fn test_empty_file_reports_every_column_missing() {
        let layout = period_layout();
        let err = read_rows(b"", &layout, &TimestampParser::default()).unwrap_err();
        assert_eq!(err.missing_columns().len(), 9);
    }

    #[test]
    fn test_bom_and_header_whitespace_tolerated() {
        let layout = ColumnLayout {
            name_column: "name".to_string(),
            periods: vec![PeriodColumns {
                label: "1".to_string(),
                duration_header: "p1".to_string(),
                start_column: "start".to_string(),
                end_column: "end".to_string(),
            }],
            duration_column: None,
            total_header: "total".to_string(),
        };
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"name , start,end\nKim (x),2024-03-05 09:00,2024-03-05 09:30\n");

        let ingested = read_rows(&bytes, &layout, &TimestampParser::default()).unwrap();
        assert_eq!(ingested.rows.len(), 1);
        let row = &ingested.rows[0];
        assert_eq!(row.identity, "Kim");
        assert_eq!(row.line, 2);
        assert!(row.intervals[0].bounds().is_some());
    }

    #[test]
    fn test_bad_cells_degrade_and_are_counted() {
        let layout = ColumnLayout {
            name_column: "name".to_string(),
            periods: vec![PeriodColumns {
                label: "1".to_string(),
                duration_header: "p1".to_string(),
                start_column: "start".to_string(),
                end_column: "end".to_string(),
            }],
            duration_column: Some("minutes".to_string()),
            total_header: "total".to_string(),
        };
        let csv = "name,start,end,minutes\n\
                   Kim,2024-03-05 09:00,N/A,abc\n\
                   Lee,garbage,2024-03-05 10:00,-3\n\
                   Park\n";

        let ingested = read_rows(csv.as_bytes(), &layout, &TimestampParser::default()).unwrap();
        assert_eq!(ingested.stats.rows_read, 3);
        assert_eq!(ingested.stats.unparseable_timestamps, 1);
        assert_eq!(ingested.stats.unparseable_durations, 1);
        assert_eq!(ingested.stats.clamped_intervals, 1);

        assert_eq!(ingested.rows[0].intervals[0].end, None);
        assert_eq!(ingested.rows[0].reported_minutes, None);
        assert_eq!(ingested.rows[1].intervals[0].start, None);
        assert_eq!(ingested.rows[1].reported_minutes, Some(0));
        assert_eq!(ingested.rows[2].intervals[0], PeriodInterval::default());
    }

    #[test]
    fn test_reported_minutes_truncate() {
        let mut stats = IngestStats::default();
        assert_eq!(parse_reported_minutes("35.9", &mut stats), Some(35));
        assert_eq!(parse_reported_minutes(" 12 ", &mut stats), Some(12));
        assert_eq!(parse_reported_minutes("", &mut stats), None);
        assert_eq!(stats, IngestStats::default());
    }
}
