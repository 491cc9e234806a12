//! Run configuration loaded from `rollcall.toml`
//!
//! Every field has a default matching the Korean videoconference export, so
//! an empty file (or no file at all) reproduces the four-period layout.
//!
//! # Example rollcall.toml
//!
//! ```toml
//! policy = "span"
//! order = "alphabetical"
//! name_column = "Name (Original Name)"
//! total_header = "Total Minutes"
//!
//! [[periods]]
//! label = "P1"
//! start_column = "P1 Join"
//! end_column = "P1 Leave"
//! ```

use crate::aggregate::RowOrder;
use crate::ingest::{ColumnLayout, PeriodColumns};
use crate::reconcile::Policy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Column names for one configured period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpec {
    /// Period name, e.g. "1교시"
    pub label: String,
    pub start_column: String,
    pub end_column: String,
    /// Output header for the minute count; defaults to "<label> 접속시간"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_header: Option<String>,
}

impl PeriodSpec {
    pub fn new(label: &str, start_column: &str, end_column: &str) -> Self {
        Self {
            label: label.to_string(),
            start_column: start_column.to_string(),
            end_column: end_column.to_string(),
            duration_header: None,
        }
    }

    pub fn duration_header(&self) -> String {
        self.duration_header
            .clone()
            .unwrap_or_else(|| format!("{} 접속시간", self.label))
    }
}

/// Columns of the single-connection export that carries its own minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassThroughColumns {
    pub label: String,
    pub join_column: String,
    pub leave_column: String,
    pub duration_column: String,
}

impl Default for PassThroughColumns {
    fn default() -> Self {
        Self {
            label: "접속".to_string(),
            join_column: "참가 시간".to_string(),
            leave_column: "나가기 시간".to_string(),
            duration_column: "기간(분)".to_string(),
        }
    }
}

/// Configuration for one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub policy: Policy,
    pub order: RowOrder,
    pub name_column: String,
    pub total_header: String,
    pub periods: Vec<PeriodSpec>,
    pub pass_through: PassThroughColumns,
    /// chrono formats tried before the built-in ones
    pub timestamp_formats: Vec<String>,
}

fn default_name_column() -> String {
    "이름(원래 이름)".to_string()
}

fn default_total_header() -> String {
    "통합 접속시간".to_string()
}

fn default_periods() -> Vec<PeriodSpec> {
    (1..=4)
        .map(|n| {
            PeriodSpec::new(
                &format!("{}교시", n),
                &format!("{}차시 시작", n),
                &format!("{}차시 종료", n),
            )
        })
        .collect()
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            order: RowOrder::default(),
            name_column: default_name_column(),
            total_header: default_total_header(),
            periods: default_periods(),
            pass_through: PassThroughColumns::default(),
            timestamp_formats: Vec::new(),
        }
    }
}

impl ReconcileConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject layouts no input could satisfy
    pub fn validate(&self) -> Result<()> {
        if self.name_column.trim().is_empty() {
            bail!("name_column must not be empty");
        }
        if self.periods.is_empty() {
            bail!("at least one period must be configured");
        }
        for (i, period) in self.periods.iter().enumerate() {
            if period.start_column.trim().is_empty() || period.end_column.trim().is_empty() {
                bail!("period {} ({}) has an empty column name", i + 1, period.label);
            }
        }
        let pt = &self.pass_through;
        if [&pt.join_column, &pt.leave_column, &pt.duration_column]
            .iter()
            .any(|c| c.trim().is_empty())
        {
            bail!("pass_through columns must not be empty");
        }
        Ok(())
    }

    /// Resolve the input/output columns the given policy reads
    pub fn layout(&self, policy: Policy) -> ColumnLayout {
        let (periods, duration_column) = match policy {
            Policy::Span | Policy::Sum => (
                self.periods
                    .iter()
                    .map(|p| PeriodColumns {
                        label: p.label.clone(),
                        duration_header: p.duration_header(),
                        start_column: p.start_column.clone(),
                        end_column: p.end_column.clone(),
                    })
                    .collect(),
                None,
            ),
            Policy::PassThrough => {
                let pt = &self.pass_through;
                (
                    vec![PeriodColumns {
                        label: pt.label.clone(),
                        duration_header: pt.duration_column.clone(),
                        start_column: pt.join_column.clone(),
                        end_column: pt.leave_column.clone(),
                    }],
                    Some(pt.duration_column.clone()),
                )
            }
        };

        ColumnLayout {
            name_column: self.name_column.clone(),
            periods,
            duration_column,
            total_header: self.total_header.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_four_period_export() {
        let config = ReconcileConfig::default();
        assert_eq!(config.policy, Policy::Sum);
        assert_eq!(config.order, RowOrder::FirstSeen);
        assert_eq!(config.periods.len(), 4);
        assert_eq!(config.periods[2].start_column, "3차시 시작");
        assert_eq!(config.periods[3].duration_header(), "4교시 접속시간");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ReconcileConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReconcileConfig::default());
    }

    #[test]
    fn test_custom_periods_and_policy() {
        let toml = r#"
            policy = "span"
            order = "alphabetical"
            name_column = "Name"

            [[periods]]
            label = "AM"
            start_column = "AM Join"
            end_column = "AM Leave"
            duration_header = "AM Minutes"

            [[periods]]
            label = "PM"
            start_column = "PM Join"
            end_column = "PM Leave"
        "#;
        let config = ReconcileConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.policy, Policy::Span);
        assert_eq!(config.order, RowOrder::Alphabetical);
        assert_eq!(config.periods.len(), 2);
        assert_eq!(config.periods[0].duration_header(), "AM Minutes");
        assert_eq!(config.periods[1].duration_header(), "PM 접속시간");
        assert_eq!(config.total_header, "통합 접속시간");
    }

    #[test]
    fn test_pass_through_policy_name() {
        let config = ReconcileConfig::from_toml_str(r#"policy = "pass-through""#).unwrap();
        assert_eq!(config.policy, Policy::PassThrough);
    }

    #[test]
    fn test_zero_periods_rejected() {
        let result = ReconcileConfig::from_toml_str("periods = []");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let result = ReconcileConfig::from_toml_str("policy = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_layout_for_pass_through() {
        let layout = ReconcileConfig::default().layout(Policy::PassThrough);
        assert_eq!(layout.periods.len(), 1);
        assert_eq!(layout.duration_column.as_deref(), Some("기간(분)"));
        assert_eq!(
            layout.required_columns(),
            vec!["이름(원래 이름)", "참가 시간", "나가기 시간", "기간(분)"]
        );
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = ReconcileConfig::from_file("/nonexistent/rollcall.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
