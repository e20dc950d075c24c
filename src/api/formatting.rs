//! Human-readable status lines for position updates and diagnostics

use crate::core::{OutputRounding, PositionEstimate};
use crate::validation::Diagnostic;

/// Formats per-tag status and log lines
#[derive(Debug, Clone, Copy)]
pub struct StatusFormatter {
    /// Decimals used for floating point coordinates
    pub decimals: usize,
}

impl Default for StatusFormatter {
    fn default() -> Self {
        Self { decimals: 1 }
    }
}

impl StatusFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Tag 1: (65,40) [Anchors:4]`
    pub fn format_position(&self, estimate: &PositionEstimate, rounding: OutputRounding) -> String {
        format!(
            "Tag {}: ({},{}) [Anchors:{}]",
            estimate.tag_id,
            self.coordinate(estimate.x, rounding),
            self.coordinate(estimate.y, rounding),
            estimate.anchors_used.len()
        )
    }

    /// `Tag 1 -> (65, 40) | Used: A0:80 A1:95 A2:110`
    pub fn format_detail(&self, estimate: &PositionEstimate, rounding: OutputRounding) -> String {
        let used = estimate
            .ranges_used
            .iter()
            .map(|(id, range)| format!("A{}:{}", id, self.coordinate(*range, rounding)))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "Tag {} -> ({}, {}) | Used: {}",
            estimate.tag_id,
            self.coordinate(estimate.x, rounding),
            self.coordinate(estimate.y, rounding),
            used
        )
    }

    /// Status line for a diagnostic; `None` for lines that are dropped silently
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> Option<String> {
        match diagnostic {
            Diagnostic::NotARecord | Diagnostic::MalformedField { .. } => None,
            Diagnostic::InsufficientAnchors { tag_id, found, .. } => {
                Some(format!("Tag {}: Not enough known anchors ({} found)", tag_id, found))
            }
            Diagnostic::DegenerateGeometry { tag_id, .. } => Some(format!("Tag {}: Calc Failed", tag_id)),
        }
    }

    fn coordinate(&self, value: f64, rounding: OutputRounding) -> String {
        match rounding {
            OutputRounding::Integer => format!("{}", value.round() as i64),
            OutputRounding::Float => format!("{:.*}", self.decimals, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WireFormat;
    use crate::validation::Stage;

    fn estimate() -> PositionEstimate {
        PositionEstimate {
            tag_id: 1,
            x: 65.0,
            y: 40.26,
            format: WireFormat::AtRange,
            anchors_used: vec![0, 1, 2],
            ranges_used: vec![(0, 80.0), (1, 95.0), (2, 110.0)],
        }
    }

    #[test]
    fn test_position_lines() {
        let formatter = StatusFormatter::new();
        assert_eq!(
            formatter.format_position(&estimate(), OutputRounding::Integer),
            "Tag 1: (65,40) [Anchors:3]"
        );
        assert_eq!(
            formatter.format_position(&estimate(), OutputRounding::Float),
            "Tag 1: (65.0,40.3) [Anchors:3]"
        );
        assert_eq!(
            formatter.format_detail(&estimate(), OutputRounding::Integer),
            "Tag 1 -> (65, 40) | Used: A0:80 A1:95 A2:110"
        );
    }

    #[test]
    fn test_diagnostic_lines() {
        let formatter = StatusFormatter::new();
        assert_eq!(formatter.format_diagnostic(&Diagnostic::NotARecord), None);

        let short = Diagnostic::InsufficientAnchors {
            tag_id: 3,
            found: 2,
            required: 3,
            matched: vec![0, 1],
            stage: Stage::Match,
        };
        assert_eq!(
            formatter.format_diagnostic(&short).as_deref(),
            Some("Tag 3: Not enough known anchors (2 found)")
        );

        let degenerate = Diagnostic::DegenerateGeometry {
            tag_id: 3,
            determinant: 0.0,
            anchors_used: vec![0, 1, 2],
        };
        assert_eq!(formatter.format_diagnostic(&degenerate).as_deref(), Some("Tag 3: Calc Failed"));
    }
}
