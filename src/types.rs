//! Core types for the Paceband pipeline
//!
//! This module defines the data structures that flow through each stage of
//! the pipeline: canonical step records, the reconstructed series, anomaly
//! events, per-record diagnostics and the exported report payload.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Default step-rate cutoff for high-intensity minutes (steps per minute)
pub const DEFAULT_THRESHOLD: u32 = 180;

/// Default minimum spacing from the preceding series entry (seconds)
pub const DEFAULT_MIN_GAP_SECONDS: i64 = 30;

/// Default intensity-band breakpoints (steps per minute)
pub const DEFAULT_BREAKPOINTS: &[u32] = &[100, 150, 180, 200];

/// A step-count interval in canonical form, ready for apportionment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Steps counted over the interval
    pub steps: u32,
    /// Interval start (export-local UTC offset preserved)
    pub start: DateTime<FixedOffset>,
    /// Interval end
    pub end: DateTime<FixedOffset>,
    /// Name of the app or device that recorded the interval
    pub source: String,
}

/// One minute of the reconstructed cadence series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// Minute-start timestamp (seconds and sub-seconds zeroed)
    pub minute: DateTime<FixedOffset>,
    /// Rounded steps attributed to this minute
    pub steps: u32,
    /// Intensity band label (e.g. "150-180")
    pub band: String,
}

/// A flagged high-intensity minute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    /// The flagged minute
    pub minute: DateTime<FixedOffset>,
    /// Step rate at that minute
    pub steps: u32,
    /// Measured gap to the preceding series entry (seconds)
    pub gap_seconds: i64,
}

/// Why a record was dropped instead of contributing to the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// start_date or end_date could not be parsed
    UnparsableTimestamp,
    /// Step value was not a finite number
    NonNumericValue,
    /// Step value was negative
    NegativeValue,
    /// Interval start is after its end
    InvertedInterval,
    /// Interval start equals its end
    ZeroDuration,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UnparsableTimestamp => "unparsable_timestamp",
            SkipReason::NonNumericValue => "non_numeric_value",
            SkipReason::NegativeValue => "negative_value",
            SkipReason::InvertedInterval => "inverted_interval",
            SkipReason::ZeroDuration => "zero_duration",
        }
    }
}

/// A dropped record and where it sat in the raw export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Row index in the raw export
    pub index: usize,
    pub reason: SkipReason,
}

/// Per-run observability counters collected across the pipeline stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Rows in the raw export
    pub records_seen: usize,
    /// Rows that matched the step-count type and device filter
    pub records_matched: usize,
    /// Matched rows dropped with a reason
    pub skipped: Vec<SkippedRecord>,
}

impl Diagnostics {
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Tunable analysis parameters
///
/// Defaults reproduce the standard configuration: flag minutes above 180
/// steps/min spaced at least 30 seconds from the previous entry, banded over
/// breakpoints 100/150/180/200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Steps-per-minute cutoff for high-intensity flagging
    pub threshold: u32,
    /// Minimum spacing from the preceding series entry (seconds)
    pub min_gap_seconds: i64,
    /// Ordered intensity-band boundaries
    pub category_breakpoints: Vec<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_gap_seconds: DEFAULT_MIN_GAP_SECONDS,
            category_breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
        }
    }
}

/// In-memory result of a full analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceReport {
    /// Ordered per-minute series, minutes strictly increasing
    pub series: Vec<SeriesEntry>,
    /// Flagged high-intensity minutes, in series order
    pub anomalies: Vec<AnomalyEvent>,
    /// What was seen, matched and dropped along the way
    pub diagnostics: Diagnostics,
}

impl CadenceReport {
    /// The empty result: no series, no anomalies, zeroed diagnostics
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadProvenance {
    pub source_device: String,
    pub computed_at_utc: String,
}

/// Minutes spent in one intensity band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandCount {
    pub band: String,
    pub minutes: usize,
}

/// Aggregate figures for the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadSummary {
    pub records_seen: usize,
    pub records_matched: usize,
    pub records_skipped: usize,
    pub series_minutes: usize,
    pub total_steps: u64,
    pub anomaly_count: usize,
    pub bands: Vec<BandCount>,
}

/// Complete exported report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadencePayload {
    pub payload_version: String,
    pub producer: PayloadProducer,
    pub provenance: PayloadProvenance,
    pub summary: PayloadSummary,
    pub series: Vec<SeriesEntry>,
    pub anomalies: Vec<AnomalyEvent>,
}
