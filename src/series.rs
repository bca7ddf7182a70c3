//! Series building
//!
//! Turns the fractional minute buckets into an ordered series with
//! intensity-band labels.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::types::{SeriesEntry, DEFAULT_BREAKPOINTS};

/// Intensity bands over ordered step-rate breakpoints
///
/// Membership is right-open: a minute belongs to the band whose lower bound
/// it meets and whose upper bound it stays below, so with the default
/// breakpoints a rate of exactly 150 falls in "150-180", not "100-150".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSet {
    breakpoints: Vec<u32>,
}

impl Default for BandSet {
    fn default() -> Self {
        Self::new(DEFAULT_BREAKPOINTS)
    }
}

impl BandSet {
    /// Build a band set from breakpoints
    ///
    /// Breakpoints are sorted and deduplicated so labels stay well-formed.
    /// An empty list falls back to the defaults.
    pub fn new(breakpoints: &[u32]) -> Self {
        let mut breakpoints = if breakpoints.is_empty() {
            DEFAULT_BREAKPOINTS.to_vec()
        } else {
            breakpoints.to_vec()
        };
        breakpoints.sort_unstable();
        breakpoints.dedup();
        Self { breakpoints }
    }

    /// Label for a step rate, e.g. "<100", "150-180" or "200+"
    pub fn label_for(&self, steps: u32) -> String {
        let Some(&first) = self.breakpoints.first() else {
            return String::from("0+");
        };
        if steps < first {
            return format!("<{first}");
        }
        for pair in self.breakpoints.windows(2) {
            if steps < pair[1] {
                return format!("{}-{}", pair[0], pair[1]);
            }
        }
        format!("{}+", self.breakpoints[self.breakpoints.len() - 1])
    }

    /// All labels in ascending band order
    pub fn labels(&self) -> Vec<String> {
        let Some(&first) = self.breakpoints.first() else {
            return vec![String::from("0+")];
        };
        let mut labels = Vec::with_capacity(self.breakpoints.len() + 1);
        labels.push(format!("<{first}"));
        for pair in self.breakpoints.windows(2) {
            labels.push(format!("{}-{}", pair[0], pair[1]));
        }
        labels.push(format!("{}+", self.breakpoints[self.breakpoints.len() - 1]));
        labels
    }
}

/// Builder producing the ordered, banded series
pub struct SeriesBuilder;

impl SeriesBuilder {
    /// Round, order and band the minute buckets
    ///
    /// Fractional values round half away from zero (`f64::round`). Bucket
    /// keys are unique, so the resulting minutes are strictly increasing
    /// with no duplicates. An empty map yields an empty series.
    pub fn build(
        buckets: &HashMap<DateTime<FixedOffset>, f64>,
        bands: &BandSet,
    ) -> Vec<SeriesEntry> {
        let mut entries: Vec<SeriesEntry> = buckets
            .iter()
            .map(|(&minute, &fractional)| {
                let steps = fractional.round() as u32;
                SeriesEntry {
                    minute,
                    steps,
                    band: bands.label_for(steps),
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.minute);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ts(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    #[test]
    fn test_band_boundaries_are_right_open() {
        let bands = BandSet::default();
        assert_eq!(bands.label_for(99), "<100");
        assert_eq!(bands.label_for(100), "100-150");
        assert_eq!(bands.label_for(150), "150-180");
        assert_eq!(bands.label_for(180), "180-200");
        assert_eq!(bands.label_for(200), "200+");
        assert_eq!(bands.label_for(350), "200+");
    }

    #[test]
    fn test_band_labels_in_order() {
        let bands = BandSet::default();
        assert_eq!(
            bands.labels(),
            vec!["<100", "100-150", "150-180", "180-200", "200+"]
        );
    }

    #[test]
    fn test_custom_breakpoints_sorted_and_deduped() {
        let bands = BandSet::new(&[120, 60, 120]);
        assert_eq!(bands.labels(), vec!["<60", "60-120", "120+"]);
        assert_eq!(bands.label_for(60), "60-120");
    }

    #[test]
    fn test_empty_breakpoints_fall_back_to_defaults() {
        assert_eq!(BandSet::new(&[]), BandSet::default());
    }

    #[test]
    fn test_build_orders_and_rounds() {
        let mut buckets = HashMap::new();
        buckets.insert(ts("2024-01-15T10:02:00Z"), 150.2);
        buckets.insert(ts("2024-01-15T10:00:00Z"), 99.5);
        buckets.insert(ts("2024-01-15T10:01:00Z"), 149.5);

        let series = SeriesBuilder::build(&buckets, &BandSet::default());

        let minutes: Vec<_> = series.iter().map(|e| e.minute).collect();
        assert_eq!(
            minutes,
            vec![
                ts("2024-01-15T10:00:00Z"),
                ts("2024-01-15T10:01:00Z"),
                ts("2024-01-15T10:02:00Z"),
            ]
        );

        // Half-away-from-zero rounding.
        assert_eq!(series[0].steps, 100);
        assert_eq!(series[0].band, "100-150");
        assert_eq!(series[1].steps, 150);
        assert_eq!(series[1].band, "150-180");
        assert_eq!(series[2].steps, 150);
    }

    #[test]
    fn test_minutes_strictly_increasing() {
        let mut buckets = HashMap::new();
        for hour in [9, 10, 11] {
            for minute in [0, 15, 30, 45] {
                buckets.insert(
                    ts(&format!("2024-01-15T{hour:02}:{minute:02}:00Z")),
                    42.0,
                );
            }
        }

        let series = SeriesBuilder::build(&buckets, &BandSet::default());
        assert_eq!(series.len(), 12);
        assert!(series.windows(2).all(|w| w[0].minute < w[1].minute));
    }

    #[test]
    fn test_empty_buckets_yield_empty_series() {
        let series = SeriesBuilder::build(&HashMap::new(), &BandSet::default());
        assert!(series.is_empty());
    }
}
