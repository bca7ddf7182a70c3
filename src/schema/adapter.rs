//! Parsing entry points for health export records
//!
//! Accepts exports as a JSON array or as NDJSON (one record per line) and
//! produces batch validation reports for the CLI.

use crate::error::AnalysisError;
use crate::schema::export_record::{ExportRecord, ValidationError};

/// Adapter for reading export records out of raw text
pub struct ExportAdapter;

impl ExportAdapter {
    /// Parse a JSON string containing an array of export records
    pub fn parse_array(json: &str) -> Result<Vec<ExportRecord>, AnalysisError> {
        let records: Vec<ExportRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing export records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ExportRecord>, AnalysisError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ExportRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(AnalysisError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[ExportRecord]) -> Vec<ValidationFailure> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.validate().err().map(|error| ValidationFailure {
                    index,
                    source_name: record.source_name.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A record that failed validation, with its position in the input
#[derive(Debug)]
pub struct ValidationFailure {
    pub index: usize,
    pub source_name: String,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRAY_INPUT: &str = r#"[
        {"type": "step_count", "source_name": "iPhone",
         "start_date": "2024-01-15T10:00:00Z", "end_date": "2024-01-15T10:02:00Z", "value": 120},
        {"type": "heart_rate", "source_name": "Apple Watch",
         "start_date": "2024-01-15T10:00:00Z", "end_date": "2024-01-15T10:00:05Z", "value": 72}
    ]"#;

    #[test]
    fn test_parse_array() {
        let records = ExportAdapter::parse_array(ARRAY_INPUT).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_name, "iPhone");
    }

    #[test]
    fn test_parse_array_invalid() {
        assert!(ExportAdapter::parse_array("not valid json").is_err());
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = concat!(
            r#"{"type": "step_count", "source_name": "iPhone", "start_date": "2024-01-15T10:00:00Z", "end_date": "2024-01-15T10:02:00Z", "value": 120}"#,
            "\n\n",
            r#"{"type": "step_count", "source_name": "iPhone", "start_date": "2024-01-15T10:02:00Z", "end_date": "2024-01-15T10:03:00Z", "value": 95}"#,
            "\n",
        );
        let records = ExportAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = concat!(
            r#"{"type": "step_count", "source_name": "iPhone", "start_date": "2024-01-15T10:00:00Z", "end_date": "2024-01-15T10:02:00Z", "value": 120}"#,
            "\n",
            "{broken",
        );
        let err = ExportAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_validate_records() {
        let mut records = ExportAdapter::parse_array(ARRAY_INPUT).unwrap();
        records[1].source_name = String::new();

        let failures = ExportAdapter::validate_records(&records);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
    }
}
