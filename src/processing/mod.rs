//! Range report processing ahead of and after the solver

pub mod parser;
pub mod matcher;
pub mod range_filter;
pub mod smoother;

pub use parser::{DecodeError, LineDecoder};
pub use matcher::{AnchorMatcher, InsufficientKnownAnchors};
pub use range_filter::RangeFilter;
pub use smoother::{PositionSmoother, SmoothedPosition, SmoothingStep};
