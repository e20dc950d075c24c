//! UWB Tag Positioning
//!
//! Turns ranging reports from a serial UWB receiver into smoothed 2-D tag
//! positions by multilateration against a table of fixed anchors.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod hardware;
pub mod api;

// Re-export commonly used types
pub use crate::core::{
    AnchorId, AnchorTable, Coordinate, OutputRounding, PositionEstimate, RangeMeasurement,
    RangeReport, TagId, WireFormat,
};
pub use crate::algorithms::{MultilaterationSolver, SolveError};
pub use crate::processing::{AnchorMatcher, DecodeError, LineDecoder, PositionSmoother, RangeFilter};
pub use crate::validation::Diagnostic;
pub use crate::utils::{AnchorConfig, ConfigError, ConfigurationManager, PipelineConfig};
pub use crate::hardware::LineFramer;
pub use crate::api::{PositionSink, PositioningPipeline, StatusFormatter, TagStatusBoard};
