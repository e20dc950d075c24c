//! Recoverable per-line diagnostics of the positioning pipeline
//!
//! None of these are fatal; after any of them the pipeline is ready for the
//! next line.

use crate::algorithms::SolveError;
use crate::core::{AnchorId, TagId};
use crate::processing::{DecodeError, InsufficientKnownAnchors};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage a line stopped at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decode,
    Match,
    Solve,
}

/// Why a line did not produce a position update
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Line is not a ranging record; silently ignored
    #[error("not a ranging record")]
    NotARecord,
    /// A required field such as the tag id is missing
    #[error("malformed field '{field}'")]
    MalformedField { field: String },
    /// Fewer usable known anchors than a 2-D fix needs
    #[error("Tag {tag_id}: Not enough known anchors ({found} found)")]
    InsufficientAnchors {
        tag_id: TagId,
        found: usize,
        required: usize,
        matched: Vec<AnchorId>,
        stage: Stage,
    },
    /// Solver rejected the anchor geometry or produced no finite position
    #[error("Tag {tag_id}: Calc Failed (determinant {determinant:e})")]
    DegenerateGeometry {
        tag_id: TagId,
        determinant: f64,
        anchors_used: Vec<AnchorId>,
    },
}

impl Diagnostic {
    pub fn tag_id(&self) -> Option<TagId> {
        match self {
            Diagnostic::NotARecord | Diagnostic::MalformedField { .. } => None,
            Diagnostic::InsufficientAnchors { tag_id, .. }
            | Diagnostic::DegenerateGeometry { tag_id, .. } => Some(*tag_id),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Diagnostic::NotARecord | Diagnostic::MalformedField { .. } => Stage::Decode,
            Diagnostic::InsufficientAnchors { stage, .. } => *stage,
            Diagnostic::DegenerateGeometry { .. } => Stage::Solve,
        }
    }

    /// Lines that should be dropped without any user-visible message
    pub fn is_silent(&self) -> bool {
        matches!(self, Diagnostic::NotARecord | Diagnostic::MalformedField { .. })
    }

    pub(crate) fn from_decode(error: DecodeError) -> Self {
        match error {
            DecodeError::NotARecord => Diagnostic::NotARecord,
            DecodeError::MalformedField { field } => Diagnostic::MalformedField {
                field: field.to_string(),
            },
            DecodeError::InsufficientPairs { tag_id, ranges, anchors } => {
                Diagnostic::InsufficientAnchors {
                    tag_id,
                    found: ranges.min(anchors),
                    required: crate::core::MIN_ANCHORS,
                    matched: Vec::new(),
                    stage: Stage::Decode,
                }
            }
        }
    }

    pub(crate) fn from_match(tag_id: TagId, error: InsufficientKnownAnchors) -> Self {
        Diagnostic::InsufficientAnchors {
            tag_id,
            found: error.found,
            required: error.required,
            matched: error.matched,
            stage: Stage::Match,
        }
    }

    pub(crate) fn from_solve(tag_id: TagId, anchors_used: Vec<AnchorId>, error: SolveError) -> Self {
        match error {
            SolveError::InsufficientMeasurements { available, required } => {
                Diagnostic::InsufficientAnchors {
                    tag_id,
                    found: available,
                    required,
                    matched: anchors_used,
                    stage: Stage::Solve,
                }
            }
            SolveError::DegenerateGeometry { determinant }
            | SolveError::NonFiniteSolution { determinant } => Diagnostic::DegenerateGeometry {
                tag_id,
                determinant,
                anchors_used,
            },
        }
    }
}
