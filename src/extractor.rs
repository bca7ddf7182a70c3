//! Record extraction
//!
//! Filters raw export records down to step-count rows from a single source
//! and converts them to canonical `StepRecord`s. The source match is exact
//! and case-sensitive; no normalization is applied. Rows with unparsable
//! timestamps or non-numeric/negative values are dropped individually and
//! reported, never aborting the batch.

use chrono::{DateTime, FixedOffset};
use log::debug;

use crate::schema::{ExportRecord, RecordKind};
use crate::types::{SkipReason, SkippedRecord, StepRecord};

/// Result of extracting step records for one device
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Canonical step records, in export order
    pub records: Vec<StepRecord>,
    /// Row index in the raw export for each entry of `records`
    pub source_rows: Vec<usize>,
    /// Matched rows that could not be canonicalized
    pub skipped: Vec<SkippedRecord>,
    /// Rows in the raw export
    pub records_seen: usize,
    /// Rows that matched the step-count type and device filter
    pub records_matched: usize,
}

/// Extractor for step-count rows of a single device
pub struct RecordExtractor;

impl RecordExtractor {
    /// Extract step-count records whose source matches `device` exactly
    pub fn extract(records: &[ExportRecord], device: &str) -> Extraction {
        let mut extraction = Extraction {
            records_seen: records.len(),
            ..Extraction::default()
        };

        for (index, record) in records.iter().enumerate() {
            if record.record_type != RecordKind::StepCount || record.source_name != device {
                continue;
            }
            extraction.records_matched += 1;

            let Some(start) = parse_export_timestamp(&record.start_date) else {
                extraction.skip(index, SkipReason::UnparsableTimestamp);
                continue;
            };
            let Some(end) = parse_export_timestamp(&record.end_date) else {
                extraction.skip(index, SkipReason::UnparsableTimestamp);
                continue;
            };
            let steps = match parse_step_value(&record.value) {
                Ok(steps) => steps,
                Err(reason) => {
                    extraction.skip(index, reason);
                    continue;
                }
            };

            extraction.records.push(StepRecord {
                steps,
                start,
                end,
                source: record.source_name.clone(),
            });
            extraction.source_rows.push(index);
        }

        extraction
    }
}

impl Extraction {
    fn skip(&mut self, index: usize, reason: SkipReason) {
        debug!("skipping export row {index}: {}", reason.as_str());
        self.skipped.push(SkippedRecord { index, reason });
    }
}

/// Parse an export timestamp
///
/// Accepts RFC 3339 and the flattened `YYYY-MM-DD HH:MM:SS ±HHMM` form
/// health exports commonly use. The UTC offset is preserved.
pub fn parse_export_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
}

/// Coerce an export value to a whole step count
///
/// Exports emit numbers or numeric strings; fractional values are truncated
/// toward zero.
fn parse_step_value(value: &serde_json::Value) -> Result<u32, SkipReason> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(v) if !v.is_finite() => Err(SkipReason::NonNumericValue),
        Some(v) if v < 0.0 => Err(SkipReason::NegativeValue),
        Some(v) => Ok(v as u32),
        None => Err(SkipReason::NonNumericValue),
    }
}
