//! End-to-end pipeline: raw export bytes in, reconciled table out

use crate::aggregate::{assemble, AttendanceTable};
use crate::config::ReconcileConfig;
use crate::error::Result;
use crate::ingest::{read_rows, IngestStats};
use crate::reconcile::{reconcile, Policy};
use crate::timestamp::TimestampParser;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Result of one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceReport {
    pub policy: Policy,
    pub table: AttendanceTable,
    pub stats: IngestStats,
}

/// Reconcile an in-memory export
///
/// Fails only when a required column is missing or the CSV stream is
/// structurally broken. An export with a header but no data rows yields an
/// empty table.
///
/// # Example
///
/// ```
/// use rollcall::{reconcile_bytes, ReconcileConfig};
///
/// let csv = "이름(원래 이름),1차시 시작,1차시 종료,2차시 시작,2차시 종료,\
///            3차시 시작,3차시 종료,4차시 시작,4차시 종료\n\
///            Kim (host),2024-03-05 09:00,2024-03-05 09:40,,,,,,\n";
/// let report = reconcile_bytes(csv.as_bytes(), &ReconcileConfig::default()).unwrap();
/// assert_eq!(report.table.rows[0].identity, "Kim");
/// assert_eq!(report.table.rows[0].total_minutes, 40);
/// ```
pub fn reconcile_bytes(bytes: &[u8], config: &ReconcileConfig) -> Result<AttendanceReport> {
    let layout = config.layout(config.policy);
    let parser = TimestampParser::new(&config.timestamp_formats);

    let ingested = read_rows(bytes, &layout, &parser)?;
    let mut stats = ingested.stats;

    if ingested.rows.is_empty() {
        warn!("attendance export has no data rows");
    }

    let reconciled = reconcile(&ingested.rows, layout.periods.len(), config.policy, &mut stats);
    let table = assemble(reconciled, &layout, config.order);

    info!(
        participants = table.len(),
        policy = %config.policy,
        "reconciled attendance"
    );

    Ok(AttendanceReport {
        policy: config.policy,
        table,
        stats,
    })
}

/// Read a file fully, then reconcile it
pub fn reconcile_file<P: AsRef<Path>>(path: P, config: &ReconcileConfig) -> Result<AttendanceReport> {
    let bytes = fs::read(path)?;
    reconcile_bytes(&bytes, config)
}
