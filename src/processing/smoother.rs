//! Exponential position smoothing with a stillness dead zone
//!
//! A tag starts uninitialized; its first solved position is reported as is.
//! Afterwards every raw solve is blended into the previous report and the
//! blend is dropped in favour of the previous report when it moved less than
//! the fluctuation threshold (Manhattan distance).

use crate::core::{Coordinate, OutputRounding, TagId, DEFAULT_FLUCTUATION_THRESHOLD_CM};
use std::collections::HashMap;

/// What the smoother did with a raw solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingStep {
    /// First fix for the tag, accepted verbatim
    Initialized,
    /// Blend moved far enough to be reported
    Moved,
    /// Blend fell inside the dead zone, previous report repeated
    Held,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPosition {
    pub position: Coordinate,
    pub step: SmoothingStep,
}

/// Per-tag smoothing state
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    threshold_cm: f64,
    last_reported: HashMap<TagId, Coordinate>,
}

impl PositionSmoother {
    pub fn new(threshold_cm: f64) -> Self {
        Self {
            threshold_cm,
            last_reported: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_cm
    }

    pub fn set_threshold(&mut self, threshold_cm: f64) {
        self.threshold_cm = threshold_cm;
    }

    /// Feed a raw solve for `tag_id` and get the position to report.
    ///
    /// `alpha` weights the raw solve in the blend; `rounding` is applied to
    /// the blend before the dead-zone comparison.
    pub fn update(
        &mut self,
        tag_id: TagId,
        raw: Coordinate,
        alpha: f64,
        rounding: OutputRounding,
    ) -> SmoothedPosition {
        let Some(prior) = self.last_reported.get(&tag_id).copied() else {
            let position = rounding.apply(raw);
            self.last_reported.insert(tag_id, position);
            return SmoothedPosition {
                position,
                step: SmoothingStep::Initialized,
            };
        };

        // Integer output rounds half away from zero; it never truncates toward zero
        let blended = rounding.apply(prior + (raw - prior) * alpha);
        let delta = blended - prior;

        if delta.x.abs() + delta.y.abs() < self.threshold_cm {
            return SmoothedPosition {
                position: prior,
                step: SmoothingStep::Held,
            };
        }

        self.last_reported.insert(tag_id, blended);
        SmoothedPosition {
            position: blended,
            step: SmoothingStep::Moved,
        }
    }

    pub fn last_position(&self, tag_id: TagId) -> Option<Coordinate> {
        self.last_reported.get(&tag_id).copied()
    }

    pub fn forget(&mut self, tag_id: TagId) {
        self.last_reported.remove(&tag_id);
    }

    pub fn clear(&mut self) {
        self.last_reported.clear();
    }
}

impl Default for PositionSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_FLUCTUATION_THRESHOLD_CM)
    }
}
