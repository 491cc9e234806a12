//! CLI argument parsing for rollcall

use crate::aggregate::RowOrder;
use crate::config::ReconcileConfig;
use crate::reconcile::Policy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for attendance summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV with byte-order mark for spreadsheets
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version)]
#[command(about = "Per-participant attendance summary from a videoconference CSV export", long_about = None)]
pub struct Cli {
    /// Attendance export to read (CSV with header row)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Reconciliation policy (overrides the config file)
    #[arg(long = "policy", value_enum)]
    pub policy: Option<Policy>,

    /// Output row order (overrides the config file)
    #[arg(long = "order", value_enum)]
    pub order: Option<RowOrder>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Write a CSV summary with a timestamped file name into this directory
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML configuration file (column names, periods, formats)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, mut config: ReconcileConfig) -> ReconcileConfig {
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(order) = self.order {
            config.order = order;
        }
        config
    }
}
