//! Anomaly detection
//!
//! Flags minutes whose step rate exceeds a threshold with sufficient spacing
//! from the preceding series entry.

use crate::types::{AnalysisConfig, AnomalyEvent, SeriesEntry};

/// Detector for sustained high-intensity minutes
pub struct AnomalyDetector;

impl AnomalyDetector {
    /// Scan the ordered series for high-intensity minutes
    ///
    /// An entry qualifies when its rate exceeds `config.threshold` and at
    /// least `config.min_gap_seconds` separate it from the immediately
    /// preceding series entry. The gap is measured against the previous
    /// entry, not the last qualifying one: in a dense series of consecutive
    /// minutes the gap is always exactly 60 seconds, so the rate check
    /// dominates there. The first entry is never flagged, and an empty or
    /// single-entry series yields no events.
    pub fn detect(series: &[SeriesEntry], config: &AnalysisConfig) -> Vec<AnomalyEvent> {
        let mut events = Vec::new();

        for pair in series.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.steps <= config.threshold {
                continue;
            }
            let gap_seconds = (current.minute - previous.minute).num_seconds();
            if gap_seconds >= config.min_gap_seconds {
                events.push(AnomalyEvent {
                    minute: current.minute,
                    steps: current.steps,
                    gap_seconds,
                });
            }
        }

        events
    }
}
