//! Report encoding and export
//!
//! Encodes a finished analysis into a versioned JSON payload and writes the
//! ordered series as CSV. Output concerns only; the pipeline result itself
//! stays an in-memory value.

use std::io::Write;

use chrono::Utc;
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::series::BandSet;
use crate::types::{
    BandCount, CadencePayload, CadenceReport, PayloadProducer, PayloadProvenance, PayloadSummary,
    SeriesEntry,
};
use crate::{PACEBAND_VERSION, PRODUCER_NAME};

/// Current report payload version
pub const PAYLOAD_VERSION: &str = "cadence.report.v1";

/// Encoder for producing report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode an analysis run into a report payload
    pub fn encode(&self, report: &CadenceReport, device: &str, bands: &BandSet) -> CadencePayload {
        let computed_at = Utc::now();
        let total_steps: u64 = report.series.iter().map(|e| u64::from(e.steps)).sum();

        let producer = PayloadProducer {
            name: PRODUCER_NAME.to_string(),
            version: PACEBAND_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = PayloadProvenance {
            source_device: device.to_string(),
            computed_at_utc: computed_at.to_rfc3339(),
        };

        let summary = PayloadSummary {
            records_seen: report.diagnostics.records_seen,
            records_matched: report.diagnostics.records_matched,
            records_skipped: report.diagnostics.skip_count(),
            series_minutes: report.series.len(),
            total_steps,
            anomaly_count: report.anomalies.len(),
            bands: band_distribution(&report.series, bands),
        };

        CadencePayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer,
            provenance,
            summary,
            series: report.series.clone(),
            anomalies: report.anomalies.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        report: &CadenceReport,
        device: &str,
        bands: &BandSet,
    ) -> Result<String, AnalysisError> {
        let payload = self.encode(report, device, bands);
        serde_json::to_string_pretty(&payload).map_err(AnalysisError::JsonError)
    }
}

/// Count series minutes per band, in ascending band order
///
/// Bands with no minutes still appear with a zero count, so distributions
/// from different runs line up.
pub fn band_distribution(series: &[SeriesEntry], bands: &BandSet) -> Vec<BandCount> {
    let mut counts: Vec<BandCount> = bands
        .labels()
        .into_iter()
        .map(|band| BandCount { band, minutes: 0 })
        .collect();

    for entry in series {
        if let Some(count) = counts.iter_mut().find(|c| c.band == entry.band) {
            count.minutes += 1;
        }
    }

    counts
}

/// Write the ordered series as CSV rows (minute, steps, band)
pub fn write_series_csv<W: Write>(series: &[SeriesEntry], writer: W) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in series {
        csv_writer.serialize(entry)?;
    }
    csv_writer
        .flush()
        .map_err(|e| AnalysisError::EncodingError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnomalyEvent, Diagnostics, SkipReason, SkippedRecord};
    use chrono::{DateTime, FixedOffset};

    fn ts(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn sample_report() -> CadenceReport {
        let bands = BandSet::default();
        let series: Vec<SeriesEntry> = [
            ("2024-01-15T10:00:00Z", 95),
            ("2024-01-15T10:01:00Z", 160),
            ("2024-01-15T10:02:00Z", 210),
        ]
        .iter()
        .map(|&(minute, steps)| SeriesEntry {
            minute: ts(minute),
            steps,
            band: bands.label_for(steps),
        })
        .collect();

        CadenceReport {
            anomalies: vec![AnomalyEvent {
                minute: ts("2024-01-15T10:02:00Z"),
                steps: 210,
                gap_seconds: 60,
            }],
            series,
            diagnostics: Diagnostics {
                records_seen: 10,
                records_matched: 4,
                skipped: vec![SkippedRecord {
                    index: 7,
                    reason: SkipReason::ZeroDuration,
                }],
            },
        }
    }

    #[test]
    fn test_encode_payload() {
        let report = sample_report();
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let payload = encoder.encode(&report, "iPhone", &BandSet::default());

        assert_eq!(payload.payload_version, PAYLOAD_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.provenance.source_device, "iPhone");

        assert_eq!(payload.summary.records_seen, 10);
        assert_eq!(payload.summary.records_matched, 4);
        assert_eq!(payload.summary.records_skipped, 1);
        assert_eq!(payload.summary.series_minutes, 3);
        assert_eq!(payload.summary.total_steps, 465);
        assert_eq!(payload.summary.anomaly_count, 1);

        assert_eq!(payload.series.len(), 3);
        assert_eq!(payload.anomalies.len(), 1);
    }

    #[test]
    fn test_encode_to_json() {
        let report = sample_report();
        let encoder = ReportEncoder::new();
        let json = encoder
            .encode_to_json(&report, "iPhone", &BandSet::default())
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["payload_version"], "cadence.report.v1");
        assert_eq!(parsed["summary"]["anomaly_count"], 1);
        assert_eq!(parsed["series"][1]["band"], "150-180");
    }

    #[test]
    fn test_band_distribution_includes_empty_bands() {
        let report = sample_report();
        let distribution = band_distribution(&report.series, &BandSet::default());

        let as_pairs: Vec<(&str, usize)> = distribution
            .iter()
            .map(|c| (c.band.as_str(), c.minutes))
            .collect();
        assert_eq!(
            as_pairs,
            vec![
                ("<100", 1),
                ("100-150", 0),
                ("150-180", 1),
                ("180-200", 0),
                ("200+", 1),
            ]
        );
    }

    #[test]
    fn test_write_series_csv() {
        let report = sample_report();
        let mut buffer = Vec::new();
        write_series_csv(&report.series, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("minute,steps,band"));
        assert_eq!(lines.next(), Some("2024-01-15T10:00:00+00:00,95,<100"));
        assert_eq!(lines.next(), Some("2024-01-15T10:01:00+00:00,160,150-180"));
        assert_eq!(lines.next(), Some("2024-01-15T10:02:00+00:00,210,200+"));
    }

    #[test]
    fn test_empty_report_encodes_cleanly() {
        let encoder = ReportEncoder::new();
        let payload = encoder.encode(&CadenceReport::empty(), "iPhone", &BandSet::default());

        assert_eq!(payload.summary.series_minutes, 0);
        assert_eq!(payload.summary.anomaly_count, 0);
        assert!(payload.series.is_empty());
    }
}
