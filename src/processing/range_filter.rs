//! Per-tag hysteresis gate on raw range vectors
//!
//! Each slot of a tag's range vector holds its previous value while new
//! readings stay within the fluctuation threshold. A zero reading always
//! passes through (anchor unseen), and a slot coming back from zero adopts
//! the new reading as its baseline.

use crate::core::{TagId, DEFAULT_FLUCTUATION_THRESHOLD_CM};
use std::collections::HashMap;

/// Deterministic range jitter suppressor keyed by tag id
#[derive(Debug, Clone)]
pub struct RangeFilter {
    threshold_cm: f64,
    baselines: HashMap<TagId, Vec<f64>>,
}

impl RangeFilter {
    pub fn new(threshold_cm: f64) -> Self {
        Self {
            threshold_cm,
            baselines: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_cm
    }

    pub fn set_threshold(&mut self, threshold_cm: f64) {
        self.threshold_cm = threshold_cm;
    }

    /// Filter `current` against the stored baseline for `tag_id`.
    ///
    /// Missing baselines or a change in vector length reset the tag: the
    /// current vector is adopted verbatim.
    pub fn apply(&mut self, tag_id: TagId, current: &[f64]) -> Vec<f64> {
        let output = match self.baselines.get(&tag_id) {
            Some(previous) if previous.len() == current.len() => {
                gate(previous, current, self.threshold_cm)
            }
            _ => current.to_vec(),
        };

        self.baselines.insert(tag_id, output.clone());
        output
    }

    /// Last filtered vector seen for a tag
    pub fn baseline(&self, tag_id: TagId) -> Option<&[f64]> {
        self.baselines.get(&tag_id).map(Vec::as_slice)
    }

    pub fn forget(&mut self, tag_id: TagId) {
        self.baselines.remove(&tag_id);
    }

    pub fn clear(&mut self) {
        self.baselines.clear();
    }

    pub fn tracked_tags(&self) -> usize {
        self.baselines.len()
    }
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FLUCTUATION_THRESHOLD_CM)
    }
}

fn gate(previous: &[f64], current: &[f64], threshold: f64) -> Vec<f64> {
    previous
        .iter()
        .zip(current)
        .map(|(&prev, &cur)| {
            if cur == 0.0 {
                0.0
            } else if prev == 0.0 {
                cur
            } else if (cur - prev).abs() <= threshold {
                prev
            } else {
                cur
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_adopt_and_accept() {
        let mut filter = RangeFilter::new(10.0);
        filter.apply(1, &[100.0, 0.0, 50.0]);

        let output = filter.apply(1, &[105.0, 60.0, 200.0]);
        assert_eq!(output, vec![100.0, 60.0, 200.0]);
        assert_eq!(filter.baseline(1), Some(&[100.0, 60.0, 200.0][..]));
    }

    #[test]
    fn test_zero_reading_passes_through() {
        let mut filter = RangeFilter::new(10.0);
        filter.apply(1, &[100.0, 80.0]);

        assert_eq!(filter.apply(1, &[0.0, 82.0]), vec![0.0, 80.0]);
        // the slot returning from zero takes the fresh reading
        assert_eq!(filter.apply(1, &[104.0, 75.0]), vec![104.0, 80.0]);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let mut filter = RangeFilter::new(10.0);
        filter.apply(1, &[100.0]);
        assert_eq!(filter.apply(1, &[110.0]), vec![100.0]);
        assert_eq!(filter.apply(1, &[110.5]), vec![110.5]);
    }

    #[test]
    fn test_length_change_resets_baseline() {
        let mut filter = RangeFilter::new(10.0);
        filter.apply(1, &[100.0, 100.0]);

        assert_eq!(filter.apply(1, &[101.0, 101.0, 101.0]), vec![101.0, 101.0, 101.0]);
        assert_eq!(filter.baseline(1).map(<[f64]>::len), Some(3));
    }

    #[test]
    fn test_tags_are_independent() {
        let mut filter = RangeFilter::new(10.0);
        filter.apply(1, &[100.0]);
        assert_eq!(filter.apply(2, &[105.0]), vec![105.0]);
        assert_eq!(filter.apply(1, &[105.0]), vec![100.0]);

        filter.forget(1);
        assert_eq!(filter.apply(1, &[105.0]), vec![105.0]);

        filter.clear();
        assert_eq!(filter.tracked_tags(), 0);
    }
}
