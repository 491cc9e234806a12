//! CSV output format for attendance summaries
//!
//! Written with a UTF-8 byte-order mark by default so spreadsheet
//! applications detect the encoding of Korean headers.

use crate::aggregate::AttendanceTable;
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Prefix of generated summary file names
pub const FILE_STEM: &str = "attendance_summary";

/// CSV output formatter
#[derive(Debug, Clone, Copy)]
pub struct CsvOutput {
    include_bom: bool,
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new(include_bom: bool) -> Self {
        Self { include_bom }
    }

    /// Render header and rows as CSV bytes
    pub fn to_bytes(&self, table: &AttendanceTable) -> csv::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        if self.include_bom {
            buffer.extend_from_slice(UTF8_BOM);
        }

        let mut writer = WriterBuilder::new().from_writer(buffer);
        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row.cells())?;
        }

        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }

    /// Write the table into `dir` under a name stamped with `generated_at`
    pub fn write_to_dir(
        &self,
        table: &AttendanceTable,
        dir: &Path,
        generated_at: NaiveDateTime,
    ) -> csv::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(timestamped_file_name(generated_at));
        fs::write(&path, self.to_bytes(table)?)?;
        Ok(path)
    }
}

/// File name embedding the generation time at minute resolution
pub fn timestamped_file_name(generated_at: NaiveDateTime) -> String {
    format!("{}_{}.csv", FILE_STEM, generated_at.format("%Y%m%d_%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AttendanceRow;
    use crate::reconcile::ReconciledPeriod;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn table() -> AttendanceTable {
        AttendanceTable {
            header: vec![
                "name".to_string(),
                "p1".to_string(),
                "p1 start".to_string(),
                "p1 end".to_string(),
                "total".to_string(),
            ],
            period_labels: vec!["1".to_string()],
            rows: vec![
                AttendanceRow {
                    identity: "Kim, Minji".to_string(),
                    periods: vec![ReconciledPeriod {
                        minutes: 65,
                        first_start: Some(at(9, 0)),
                        last_end: Some(at(10, 0)),
                    }],
                    total_minutes: 65,
                    connections: 2,
                },
                AttendanceRow {
                    identity: "Lee".to_string(),
                    periods: vec![ReconciledPeriod::default()],
                    total_minutes: 0,
                    connections: 1,
                },
            ],
        }
    }

    #[test]
    fn test_csv_starts_with_bom() {
        let bytes = CsvOutput::default().to_bytes(&table()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
    }

    #[test]
    fn test_csv_without_bom() {
        let bytes = CsvOutput::new(false).to_bytes(&table()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("name,p1,p1 start,p1 end,total\n"));
    }

    #[test]
    fn test_csv_rows_quoted_and_empty_bounds() {
        let bytes = CsvOutput::new(false).to_bytes(&table()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"Kim, Minji\",65,2024-03-05 09:00,2024-03-05 10:00,65\n"));
        assert!(text.contains("Lee,0,,,0\n"));
    }

    #[test]
    fn test_csv_output_is_deterministic() {
        let a = CsvOutput::default().to_bytes(&table()).unwrap();
        let b = CsvOutput::default().to_bytes(&table()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_timestamped_file_name() {
        assert_eq!(
            timestamped_file_name(at(14, 7)),
            "attendance_summary_20240305_1407.csv"
        );
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = CsvOutput::default()
            .write_to_dir(&table(), dir.path(), at(8, 30))
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "attendance_summary_20240305_0830.csv"
        );
        assert!(fs::read(&path).unwrap().starts_with(UTF8_BOM));
    }
}
