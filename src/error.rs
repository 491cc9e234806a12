//! Fatal errors for the reconciliation pipeline
//!
//! Per-value problems (a bad timestamp, an unreadable duration cell) never
//! reach this type; they degrade to zero and are counted in
//! [`IngestStats`](crate::ingest::IngestStats).

use thiserror::Error;

/// Structural failures that abort the whole computation
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    /// Column names reported by a schema failure, empty otherwise
    pub fn missing_columns(&self) -> &[String] {
        match self {
            Self::Schema { missing } => missing,
            _ => &[],
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
