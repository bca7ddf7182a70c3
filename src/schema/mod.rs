//! Input schema for personal health exports
//!
//! Defines the `health.step_record.v1` record shape and the parsing entry
//! points that read exports as a JSON array or NDJSON.

mod adapter;
mod export_record;

pub use adapter::{ExportAdapter, ValidationFailure};
pub use export_record::{ExportRecord, RecordKind, ValidationError, SCHEMA_VERSION};
