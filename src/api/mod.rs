//! Host-facing positioning API
//!
//! The pipeline turns text lines into position updates; the formatter and
//! status board produce the per-tag status text shown next to the map.

pub mod pipeline;
pub mod types;
pub mod formatting;
pub mod status;

pub use pipeline::PositioningPipeline;
pub use types::{LineOutcome, PositionSink, RecordingSink};
pub use formatting::StatusFormatter;
pub use status::TagStatusBoard;
