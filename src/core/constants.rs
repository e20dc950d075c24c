//! System parameters shared across the positioning pipeline

/// Minimum number of known anchors needed for a 2-D fix
pub const MIN_ANCHORS: usize = 3;

/// Default jitter threshold for range hysteresis and position dead zone (cm)
pub const DEFAULT_FLUCTUATION_THRESHOLD_CM: f64 = 10.0;

/// Upper bound accepted for the fluctuation threshold (cm)
pub const MAX_FLUCTUATION_THRESHOLD_CM: f64 = 100.0;

/// Normal-matrix determinant below which anchor geometry is treated as degenerate
pub const DEFAULT_DETERMINANT_TOLERANCE: f64 = 1e-4;

/// Position smoothing factor for `AT+RANGE` lines
pub const AT_RANGE_SMOOTHING_ALPHA: f64 = 0.2;

/// Position smoothing factor for JSON lines
pub const JSON_SMOOTHING_ALPHA: f64 = 0.4;

/// Literal prefix of `AT+RANGE` ranging lines
pub const AT_RANGE_PREFIX: &str = "AT+RANGE=";

/// Largest range accepted from the wire (cm); larger readings count as unused
pub const MAX_RANGE_CM: f64 = i32::MAX as f64;
