//! Pairing of decoded range slots with known anchor positions

use crate::core::{AnchorId, AnchorTable, RangeMeasurement, RangeReport, ValidRangeSet, MIN_ANCHORS};
use thiserror::Error;
use tracing::debug;

/// Not enough of the reported anchors are known to the anchor table
#[derive(Debug, Clone, PartialEq, Error)]
#[error("not enough known anchors ({found} found, {required} required)")]
pub struct InsufficientKnownAnchors {
    pub found: usize,
    pub required: usize,
    /// Known anchors that did match, in wire order
    pub matched: Vec<AnchorId>,
}

/// Intersects report slots with an [`AnchorTable`] snapshot
#[derive(Debug, Clone)]
pub struct AnchorMatcher {
    min_anchors: usize,
}

impl AnchorMatcher {
    pub fn new() -> Self {
        Self { min_anchors: MIN_ANCHORS }
    }

    /// Require more than the geometric minimum of three anchors
    pub fn with_min_anchors(min_anchors: usize) -> Self {
        Self {
            min_anchors: min_anchors.max(MIN_ANCHORS),
        }
    }

    pub fn min_anchors(&self) -> usize {
        self.min_anchors
    }

    /// Keep the slots whose anchor is known and whose range is positive.
    ///
    /// Input order is preserved. Unknown anchors are dropped silently.
    pub fn match_anchors(
        &self,
        report: &RangeReport,
        anchors: &AnchorTable,
    ) -> Result<ValidRangeSet, InsufficientKnownAnchors> {
        let measurements: Vec<RangeMeasurement> = report
            .slots
            .iter()
            .filter(|slot| slot.range > 0.0)
            .filter_map(|slot| {
                let anchor_id = slot.anchor_id?;
                anchors.get(anchor_id).map(|position| RangeMeasurement {
                    anchor_id,
                    position: *position,
                    range: slot.range,
                })
            })
            .collect();

        debug!(
            tag_id = report.tag_id,
            matched = measurements.len(),
            reported = report.slots.len(),
            "matched reported anchors against table"
        );

        if measurements.len() < self.min_anchors {
            return Err(InsufficientKnownAnchors {
                found: measurements.len(),
                required: self.min_anchors,
                matched: measurements.iter().map(|m| m.anchor_id).collect(),
            });
        }

        Ok(ValidRangeSet { measurements })
    }
}

impl Default for AnchorMatcher {
    fn default() -> Self {
        Self::new()
    }
}
