//! Common API types

use crate::core::{AnchorId, PositionEstimate, TagId};
use crate::validation::Diagnostic;

/// Result of running one line through the pipeline
pub type LineOutcome = Result<PositionEstimate, Diagnostic>;

/// Display collaborator receiving position updates
pub trait PositionSink {
    fn emit(&mut self, tag_id: TagId, x: f64, y: f64, anchors_used: &[AnchorId]);
}

/// Closures can act as sinks directly
impl<F> PositionSink for F
where
    F: FnMut(TagId, f64, f64, &[AnchorId]),
{
    fn emit(&mut self, tag_id: TagId, x: f64, y: f64, anchors_used: &[AnchorId]) {
        self(tag_id, x, y, anchors_used)
    }
}

/// Sink collecting every update, handy for tests and batch replays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    pub updates: Vec<(TagId, f64, f64, Vec<AnchorId>)>,
}

impl PositionSink for RecordingSink {
    fn emit(&mut self, tag_id: TagId, x: f64, y: f64, anchors_used: &[AnchorId]) {
        self.updates.push((tag_id, x, y, anchors_used.to_vec()));
    }
}
