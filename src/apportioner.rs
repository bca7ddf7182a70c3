//! Minute apportionment
//!
//! The core of the pipeline. Each record's step count is spread across the
//! calendar minutes it overlaps, proportional to the overlap duration, and
//! accumulated into a minute-start → fractional-steps map. The map is
//! constructed locally and returned; nothing is shared between runs.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use log::debug;

use crate::types::{SkipReason, SkippedRecord, StepRecord};

/// Fractional step counts accumulated per minute bucket, plus the records
/// that could not be apportioned
#[derive(Debug, Clone, Default)]
pub struct Apportionment {
    /// Minute-start timestamp → accumulated fractional steps
    pub buckets: HashMap<DateTime<FixedOffset>, f64>,
    /// Records dropped as inverted or zero-duration, indexed by their
    /// position in the input slice
    pub skipped: Vec<SkippedRecord>,
}

/// Apportioner spreading step counts across minute buckets
pub struct MinuteApportioner;

impl MinuteApportioner {
    /// Apportion each record's steps across the minutes it overlaps
    ///
    /// For every record the contributions across all touched minutes sum to
    /// the record's step count, up to floating-point rounding; a record
    /// spanning several minutes is split by overlap duration, not evenly
    /// per minute. Records with `start >= end` contribute nothing and are
    /// returned in `skipped`; one malformed record never aborts the batch.
    pub fn apportion(records: &[StepRecord]) -> Apportionment {
        let mut apportionment = Apportionment::default();

        for (index, record) in records.iter().enumerate() {
            let reason = if record.start > record.end {
                Some(SkipReason::InvertedInterval)
            } else if record.start == record.end {
                Some(SkipReason::ZeroDuration)
            } else {
                None
            };
            if let Some(reason) = reason {
                debug!("skipping record {index}: {}", reason.as_str());
                apportionment.skipped.push(SkippedRecord { index, reason });
                continue;
            }

            let total_seconds = seconds_between(record.start, record.end);
            let mut cursor = minute_floor(record.start);

            while cursor < record.end {
                let next = cursor + Duration::minutes(1);
                let overlap_start = record.start.max(cursor);
                let overlap_end = record.end.min(next);
                let overlap = seconds_between(overlap_start, overlap_end);

                if overlap > 0.0 {
                    *apportionment.buckets.entry(cursor).or_insert(0.0) +=
                        f64::from(record.steps) * overlap / total_seconds;
                }
                cursor = next;
            }
        }

        apportionment
    }
}

/// Truncate a timestamp to its minute boundary (seconds and sub-seconds
/// zeroed), preserving the UTC offset
pub fn minute_floor(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

fn seconds_between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn record(steps: u32, start: &str, end: &str) -> StepRecord {
        StepRecord {
            steps,
            start: ts(start),
            end: ts(end),
            source: "iPhone".to_string(),
        }
    }

    #[test]
    fn test_aligned_record_splits_evenly() {
        let records = vec![record(120, "2024-01-15T10:00:00Z", "2024-01-15T10:02:00Z")];
        let result = MinuteApportioner::apportion(&records);

        assert_eq!(result.buckets.len(), 2);
        assert!((result.buckets[&ts("2024-01-15T10:00:00Z")] - 60.0).abs() < 1e-9);
        assert!((result.buckets[&ts("2024-01-15T10:01:00Z")] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_overlap_splits_by_time() {
        let records = vec![record(60, "2024-01-15T10:00:30Z", "2024-01-15T10:01:30Z")];
        let result = MinuteApportioner::apportion(&records);

        assert_eq!(result.buckets.len(), 2);
        assert!((result.buckets[&ts("2024-01-15T10:00:00Z")] - 30.0).abs() < 1e-9);
        assert!((result.buckets[&ts("2024-01-15T10:01:00Z")] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_contributions_conserve_step_count() {
        let records = vec![
            record(487, "2024-01-15T10:00:13Z", "2024-01-15T10:07:41Z"),
            record(33, "2024-01-15T10:03:05Z", "2024-01-15T10:03:55Z"),
        ];
        let result = MinuteApportioner::apportion(&records);

        let total: f64 = result.buckets.values().sum();
        assert!((total - 520.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_records_accumulate() {
        let records = vec![
            record(60, "2024-01-15T10:00:00Z", "2024-01-15T10:01:00Z"),
            record(40, "2024-01-15T10:00:00Z", "2024-01-15T10:01:00Z"),
        ];
        let result = MinuteApportioner::apportion(&records);

        assert_eq!(result.buckets.len(), 1);
        assert!((result.buckets[&ts("2024-01-15T10:00:00Z")] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_and_zero_duration_skipped() {
        let records = vec![
            record(50, "2024-01-15T10:05:00Z", "2024-01-15T10:00:00Z"),
            record(50, "2024-01-15T10:05:00Z", "2024-01-15T10:05:00Z"),
            record(50, "2024-01-15T10:05:00Z", "2024-01-15T10:06:00Z"),
        ];
        let result = MinuteApportioner::apportion(&records);

        assert_eq!(result.buckets.len(), 1);
        assert_eq!(
            result.skipped,
            vec![
                SkippedRecord {
                    index: 0,
                    reason: SkipReason::InvertedInterval,
                },
                SkippedRecord {
                    index: 1,
                    reason: SkipReason::ZeroDuration,
                },
            ]
        );
    }

    #[test]
    fn test_sub_minute_record_lands_in_one_bucket() {
        let records = vec![record(17, "2024-01-15T10:00:10Z", "2024-01-15T10:00:40Z")];
        let result = MinuteApportioner::apportion(&records);

        assert_eq!(result.buckets.len(), 1);
        assert!((result.buckets[&ts("2024-01-15T10:00:00Z")] - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_preserved_in_bucket_keys() {
        let records = vec![record(90, "2024-01-15T10:00:00+09:00", "2024-01-15T10:01:30+09:00")];
        let result = MinuteApportioner::apportion(&records);

        // 60s of 90s in the first minute, 30s in the second.
        assert!((result.buckets[&ts("2024-01-15T10:00:00+09:00")] - 60.0).abs() < 1e-9);
        assert!((result.buckets[&ts("2024-01-15T10:01:00+09:00")] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_minute_floor() {
        assert_eq!(
            minute_floor(ts("2024-01-15T10:07:59.750+02:00")),
            ts("2024-01-15T10:07:00+02:00")
        );
    }

    #[test]
    fn test_empty_input() {
        let result = MinuteApportioner::apportion(&[]);
        assert!(result.buckets.is_empty());
        assert!(result.skipped.is_empty());
    }
}
