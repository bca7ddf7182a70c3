//! Paceband - per-minute step cadence analysis for personal health exports
//!
//! Paceband reconstructs a regular per-minute step-rate series from the
//! irregular, overlapping interval records of a personal health export
//! through a deterministic pipeline: record extraction → minute
//! apportionment → series building → anomaly detection.
//!
//! ## Modules
//!
//! - **Schema**: the `health.step_record.v1` export record shape and parsing
//! - **Extractor**: step-count rows for one device, canonicalized
//! - **Apportioner**: steps spread across minute buckets by temporal overlap
//! - **Series / Anomaly**: ordered banded series and high-intensity flags
//! - **Report**: versioned JSON payload and CSV export

pub mod anomaly;
pub mod apportioner;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod series;
pub mod types;

pub use error::AnalysisError;
pub use pipeline::{
    analyze_file, analyze_json, analyze_json_or_empty, analyze_ndjson, CadenceAnalyzer,
};
pub use report::ReportEncoder;

// Schema exports
pub use schema::{ExportAdapter, ExportRecord, SCHEMA_VERSION};

pub use types::{AnalysisConfig, CadencePayload, CadenceReport};

/// Paceband version embedded in all report payloads
pub const PACEBAND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "paceband";
