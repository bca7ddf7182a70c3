//! Pipeline orchestration
//!
//! This module provides the public API for Paceband. It wires the full
//! pipeline from raw export text to the finished cadence report:
//! extraction → apportionment → series building → anomaly detection.

use log::warn;

use crate::anomaly::AnomalyDetector;
use crate::apportioner::MinuteApportioner;
use crate::error::AnalysisError;
use crate::extractor::RecordExtractor;
use crate::schema::{ExportAdapter, ExportRecord};
use crate::series::{BandSet, SeriesBuilder};
use crate::types::{AnalysisConfig, CadenceReport, Diagnostics, SkippedRecord};

/// Analyze a JSON array of export records for one device
///
/// # Arguments
/// * `raw_json` - Export content as a JSON array of records
/// * `device` - Source name to match exactly (e.g. "iPhone")
/// * `config` - Thresholds and band breakpoints
///
/// # Example
/// ```ignore
/// let report = analyze_json(&export_text, "iPhone", &AnalysisConfig::default())?;
/// println!("{} anomalous minutes", report.anomalies.len());
/// ```
pub fn analyze_json(
    raw_json: &str,
    device: &str,
    config: &AnalysisConfig,
) -> Result<CadenceReport, AnalysisError> {
    let records = ExportAdapter::parse_array(raw_json)?;
    Ok(CadenceAnalyzer::new(config.clone()).analyze_records(&records, device))
}

/// Analyze NDJSON export records (one record per line) for one device
pub fn analyze_ndjson(
    ndjson: &str,
    device: &str,
    config: &AnalysisConfig,
) -> Result<CadenceReport, AnalysisError> {
    let records = ExportAdapter::parse_ndjson(ndjson)?;
    Ok(CadenceAnalyzer::new(config.clone()).analyze_records(&records, device))
}

/// Analyze an export file containing a JSON array of records
///
/// An unreadable file surfaces as `AnalysisError::SourceReadError`, fatal to
/// this run only.
pub fn analyze_file(
    path: &std::path::Path,
    device: &str,
    config: &AnalysisConfig,
) -> Result<CadenceReport, AnalysisError> {
    let raw_json = std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::SourceReadError(format!("{}: {e}", path.display())))?;
    analyze_json(&raw_json, device, config)
}

/// Analyze a JSON export, recovering source-level failures to an empty report
///
/// For batch contexts where one unreadable source must not abort the run:
/// the failure is logged and the empty report returned. Per-record problems
/// are already recovered inside the pipeline either way.
pub fn analyze_json_or_empty(raw_json: &str, device: &str, config: &AnalysisConfig) -> CadenceReport {
    match analyze_json(raw_json, device, config) {
        Ok(report) => report,
        Err(e) => {
            warn!("source could not be analyzed, returning empty report: {e}");
            CadenceReport::empty()
        }
    }
}

/// Configured analyzer for callers that parse input themselves
///
/// Holds the analysis configuration and its derived band set so repeated
/// runs over different record sets share one setup.
pub struct CadenceAnalyzer {
    config: AnalysisConfig,
    bands: BandSet,
}

impl Default for CadenceAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl CadenceAnalyzer {
    /// Create an analyzer from a configuration
    pub fn new(config: AnalysisConfig) -> Self {
        let bands = BandSet::new(&config.category_breakpoints);
        Self { config, bands }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn bands(&self) -> &BandSet {
        &self.bands
    }

    /// Run the pipeline over already-parsed export records
    ///
    /// Pipeline stages:
    /// 1. RecordExtractor - step-count rows for `device`, canonicalized
    /// 2. MinuteApportioner - steps spread across minute buckets
    /// 3. SeriesBuilder - ordered, banded per-minute series
    /// 4. AnomalyDetector - high-intensity minute flags
    ///
    /// Never fails: malformed records land in the diagnostics and an empty
    /// record set yields the empty report.
    pub fn analyze_records(&self, records: &[ExportRecord], device: &str) -> CadenceReport {
        let extraction = RecordExtractor::extract(records, device);
        let apportionment = MinuteApportioner::apportion(&extraction.records);
        let series = SeriesBuilder::build(&apportionment.buckets, &self.bands);
        let anomalies = AnomalyDetector::detect(&series, &self.config);

        // Apportionment skips index into the extracted slice; map them back
        // to raw export rows so all diagnostics share one index space.
        let mut skipped = extraction.skipped;
        for skip in apportionment.skipped {
            let index = extraction
                .source_rows
                .get(skip.index)
                .copied()
                .unwrap_or(skip.index);
            skipped.push(SkippedRecord { index, ..skip });
        }

        CadenceReport {
            series,
            anomalies,
            diagnostics: Diagnostics {
                records_seen: extraction.records_seen,
                records_matched: extraction.records_matched,
                skipped,
            },
        }
    }
}
