//! Rollcall - per-participant attendance summaries from videoconference exports
//!
//! This library reconciles a session attendance CSV, where one participant may
//! appear on many rows under cosmetic name variants, into one row per
//! participant with whole-minute durations per class period and a total.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod ingest;
pub mod json_output;
pub mod name;
pub mod pipeline;
pub mod reconcile;
pub mod text_output;
pub mod timestamp;

pub use aggregate::{AttendanceRow, AttendanceTable, RowOrder};
pub use config::ReconcileConfig;
pub use error::ReconcileError;
pub use pipeline::{reconcile_bytes, reconcile_file, AttendanceReport};
pub use reconcile::Policy;
