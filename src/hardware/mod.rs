//! Serial link framing
//!
//! Port handling itself lives with the host; this module only turns the raw
//! byte stream into text lines for the pipeline.

pub mod serial;

pub use serial::{FramingError, LineFramer, DEFAULT_MAX_LINE_BYTES};
