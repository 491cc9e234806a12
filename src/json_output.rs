//! JSON output format for attendance summaries

use crate::ingest::IngestStats;
use crate::pipeline::AttendanceReport;
use crate::timestamp::format_minute;
use serde::{Deserialize, Serialize};

/// One period of one participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPeriod {
    pub label: String,
    pub minutes: u64,
    /// Earliest observed start, minute resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_start: Option<String>,
    /// Latest observed end, minute resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_end: Option<String>,
}

/// One participant row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonParticipant {
    pub identity: String,
    pub periods: Vec<JsonPeriod>,
    pub total_minutes: u64,
    /// Export rows merged into this participant
    pub connections: usize,
}

/// Counters absorbed during ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonStats {
    pub rows_read: u64,
    pub identities: u64,
    pub unparseable_timestamps: u64,
    pub unparseable_durations: u64,
    pub clamped_intervals: u64,
}

impl From<&IngestStats> for JsonStats {
    fn from(stats: &IngestStats) -> Self {
        Self {
            rows_read: stats.rows_read,
            identities: stats.identities,
            unparseable_timestamps: stats.unparseable_timestamps,
            unparseable_durations: stats.unparseable_durations,
            clamped_intervals: stats.clamped_intervals,
        }
    }
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version for compatibility
    pub version: String,
    pub policy: String,
    pub periods: Vec<String>,
    pub rows: Vec<JsonParticipant>,
    pub stats: JsonStats,
}

impl JsonOutput {
    /// Build the JSON view of a report
    pub fn from_report(report: &AttendanceReport) -> Self {
        let labels = &report.table.period_labels;
        let rows = report
            .table
            .rows
            .iter()
            .map(|row| JsonParticipant {
                identity: row.identity.clone(),
                periods: row
                    .periods
                    .iter()
                    .zip(labels)
                    .map(|(period, label)| JsonPeriod {
                        label: label.clone(),
                        minutes: period.minutes,
                        first_start: period.first_start.as_ref().map(format_minute),
                        last_end: period.last_end.as_ref().map(format_minute),
                    })
                    .collect(),
                total_minutes: row.total_minutes,
                connections: row.connections,
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            policy: report.policy.to_string(),
            periods: labels.clone(),
            rows,
            stats: JsonStats::from(&report.stats),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileConfig;
    use crate::pipeline::reconcile_bytes;

    fn report() -> AttendanceReport {
        let csv = "이름(원래 이름),1차시 시작,1차시 종료,2차시 시작,2차시 종료,3차시 시작,3차시 종료,4차시 시작,4차시 종료\n\
                   Kim (00:12/Kim),2024-03-05 09:00,2024-03-05 09:30,,,,,,\n\
                   Kim,2024-03-05 09:25,2024-03-05 10:00,,,,,,\n";
        reconcile_bytes(csv.as_bytes(), &ReconcileConfig::default()).unwrap()
    }

    #[test]
    fn test_json_structure() {
        let output = JsonOutput::from_report(&report());
        assert_eq!(output.policy, "sum");
        assert_eq!(output.periods.len(), 4);
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.rows[0].periods[0].minutes, 65);
        assert_eq!(
            output.rows[0].periods[0].first_start.as_deref(),
            Some("2024-03-05 09:00")
        );
        assert_eq!(output.rows[0].total_minutes, 65);
        assert_eq!(output.rows[0].connections, 2);
        assert_eq!(output.stats.rows_read, 2);
    }

    #[test]
    fn test_json_omits_absent_bounds() {
        let json = JsonOutput::from_report(&report()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let second = &value["rows"][0]["periods"][1];
        assert_eq!(second["label"], "2교시");
        assert_eq!(second["minutes"], 0);
        assert!(second.get("first_start").is_none());
    }
}
