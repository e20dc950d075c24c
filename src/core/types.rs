//! Core data types for the positioning system

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anchor identifier as reported on the wire
pub type AnchorId = u32;

/// Tag identifier as reported on the wire
pub type TagId = u32;

/// Planar coordinate in centimeters
pub type Coordinate = Point2<f64>;

/// Known anchor positions keyed by anchor id.
///
/// The table is owned by whoever edits the anchor layout; the pipeline only
/// reads a snapshot per processed line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorTable {
    anchors: BTreeMap<AnchorId, Coordinate>,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an anchor position
    pub fn insert(&mut self, id: AnchorId, x: f64, y: f64) -> Option<Coordinate> {
        self.anchors.insert(id, Point2::new(x, y))
    }

    pub fn remove(&mut self, id: AnchorId) -> Option<Coordinate> {
        self.anchors.remove(&id)
    }

    pub fn get(&self, id: AnchorId) -> Option<&Coordinate> {
        self.anchors.get(&id)
    }

    pub fn contains(&self, id: AnchorId) -> bool {
        self.anchors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Iterate anchors in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (AnchorId, &Coordinate)> {
        self.anchors.iter().map(|(id, pos)| (*id, pos))
    }
}

impl FromIterator<(AnchorId, f64, f64)> for AnchorTable {
    fn from_iter<I: IntoIterator<Item = (AnchorId, f64, f64)>>(iter: I) -> Self {
        let mut table = AnchorTable::new();
        for (id, x, y) in iter {
            table.insert(id, x, y);
        }
        table
    }
}

/// Supported line formats coming off the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// `AT+RANGE=tid:..,range:(..),ancid:(..)` lines
    AtRange,
    /// One JSON object per line with `id`, `range` and `aid` keys
    Json,
}

/// Numeric representation of reported coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRounding {
    /// Round to whole centimeters, half away from zero
    Integer,
    /// Keep full floating point precision
    Float,
}

impl OutputRounding {
    pub fn apply(self, point: Coordinate) -> Coordinate {
        match self {
            OutputRounding::Integer => Point2::new(point.x.round(), point.y.round()),
            OutputRounding::Float => point,
        }
    }
}

/// How the range array lines up with the anchor id array for a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAlignment {
    /// Unused slots were removed independently from both arrays at parse time
    Prefiltered,
    /// Slot `i` of the range array belongs to slot `i` of the anchor array,
    /// unused slots are still present
    IndexAligned,
}

impl WireFormat {
    pub fn alignment(self) -> SlotAlignment {
        match self {
            WireFormat::AtRange => SlotAlignment::Prefiltered,
            WireFormat::Json => SlotAlignment::IndexAligned,
        }
    }
}

/// One (anchor, range) slot of a decoded report.
///
/// A range of `0.0` means the anchor is currently unseen; `anchor_id` is
/// `None` when the slot carries no usable anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSlot {
    pub anchor_id: Option<AnchorId>,
    pub range: f64,
}

impl RangeSlot {
    pub fn new(anchor_id: Option<AnchorId>, range: f64) -> Self {
        Self { anchor_id, range }
    }

    pub fn is_usable(&self) -> bool {
        self.anchor_id.is_some() && self.range > 0.0
    }
}

/// Ranging record decoded from one line
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReport {
    pub tag_id: TagId,
    pub format: WireFormat,
    pub slots: Vec<RangeSlot>,
}

impl RangeReport {
    /// Raw range vector in wire order
    pub fn ranges(&self) -> Vec<f64> {
        self.slots.iter().map(|slot| slot.range).collect()
    }

    /// Replace slot ranges positionally with a filtered vector.
    ///
    /// Extra values beyond the slot count are ignored.
    pub fn apply_ranges(&mut self, ranges: &[f64]) {
        for (slot, range) in self.slots.iter_mut().zip(ranges) {
            slot.range = *range;
        }
    }
}

/// Anchor position paired with its measured range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMeasurement {
    pub anchor_id: AnchorId,
    pub position: Coordinate,
    pub range: f64,
}

impl RangeMeasurement {
    pub fn new(anchor_id: AnchorId, x: f64, y: f64, range: f64) -> Self {
        Self {
            anchor_id,
            position: Point2::new(x, y),
            range,
        }
    }
}

/// Measurements whose anchors are present in the anchor table, in wire order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidRangeSet {
    pub measurements: Vec<RangeMeasurement>,
}

impl ValidRangeSet {
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn anchor_ids(&self) -> Vec<AnchorId> {
        self.measurements.iter().map(|m| m.anchor_id).collect()
    }
}

/// Final smoothed position for a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    pub tag_id: TagId,
    pub x: f64,
    pub y: f64,
    pub format: WireFormat,
    /// Anchors that contributed to the solve, in wire order
    pub anchors_used: Vec<AnchorId>,
    /// `(anchor, range)` pairs as fed to the solver
    pub ranges_used: Vec<(AnchorId, f64)>,
}
