//! health.step_record.v1 schema definition
//!
//! The flattened row shape a personal health export produces once converted
//! to JSON: one row per sampled interval, carrying the measurement type, the
//! originating source, the interval timestamps and a value. Timestamps stay
//! strings at this layer so one malformed row cannot poison whole-file
//! deserialization; the extractor parses them per record.

use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "health.step_record.v1";

/// Measurement types found in a health export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    StepCount,
    DistanceWalkingRunning,
    FlightsClimbed,
    HeartRate,
    ActiveEnergyBurned,
    BasalEnergyBurned,
    AppleExerciseTime,
    /// For custom/unknown record types, preserved verbatim
    #[serde(untagged)]
    Other(String),
}

impl RecordKind {
    pub fn as_str(&self) -> &str {
        match self {
            RecordKind::StepCount => "step_count",
            RecordKind::DistanceWalkingRunning => "distance_walking_running",
            RecordKind::FlightsClimbed => "flights_climbed",
            RecordKind::HeartRate => "heart_rate",
            RecordKind::ActiveEnergyBurned => "active_energy_burned",
            RecordKind::BasalEnergyBurned => "basal_energy_burned",
            RecordKind::AppleExerciseTime => "apple_exercise_time",
            RecordKind::Other(name) => name.as_str(),
        }
    }
}

/// One row of a health export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Type of measurement this row carries
    #[serde(rename = "type")]
    pub record_type: RecordKind,
    /// Name of the app or device that produced the row
    pub source_name: String,
    /// Interval start, RFC 3339 or flattened `YYYY-MM-DD HH:MM:SS ±HHMM`
    pub start_date: String,
    /// Interval end, same formats as `start_date`
    pub end_date: String,
    /// Measured value; exports emit numbers or numeric strings
    pub value: serde_json::Value,
    /// Measurement unit as exported (e.g. "count")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Hardware device description, when distinct from the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl ExportRecord {
    /// Create a step-count row
    pub fn step_count(
        source_name: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        ExportRecord {
            record_type: RecordKind::StepCount,
            source_name: source_name.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            value: value.into(),
            unit: Some("count".to_string()),
            device: None,
        }
    }

    /// Validate the record structure
    ///
    /// Structural checks only; timestamp and value parsing happen at
    /// extraction, where failures are recoverable per record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_name.trim().is_empty() {
            return Err(ValidationError::EmptySourceName);
        }
        if self.start_date.trim().is_empty() {
            return Err(ValidationError::EmptyTimestamp {
                field: "start_date",
            });
        }
        if self.end_date.trim().is_empty() {
            return Err(ValidationError::EmptyTimestamp { field: "end_date" });
        }
        Ok(())
    }
}

/// Validation errors for export records
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("record has an empty source_name")]
    EmptySourceName,

    #[error("record has an empty {field}")]
    EmptyTimestamp { field: &'static str },
}
