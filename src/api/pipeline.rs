//! Line-by-line positioning pipeline
//!
//! decode → (range filter) → anchor match → solve → smooth. Each call runs to
//! completion on the caller's thread; per-tag state lives in the pipeline
//! instance and is only touched through `&mut self`.

use crate::algorithms::MultilaterationSolver;
use crate::api::types::{LineOutcome, PositionSink};
use crate::core::{AnchorTable, PositionEstimate, SlotAlignment, TagId};
use crate::processing::{AnchorMatcher, LineDecoder, PositionSmoother, RangeFilter};
use crate::utils::config::{validate_threshold, ConfigError, PipelineConfig};
use crate::validation::Diagnostic;
use tracing::{debug, trace, warn};

pub struct PositioningPipeline {
    config: PipelineConfig,
    decoder: LineDecoder,
    matcher: AnchorMatcher,
    range_filter: RangeFilter,
    solver: MultilaterationSolver,
    smoother: PositionSmoother,
}

impl PositioningPipeline {
    /// Build a pipeline; an invalid configuration is the only fatal error
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let validation = config.validate();
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }
        for warning in &validation.warnings {
            warn!("{}", warning);
        }

        Ok(Self {
            decoder: LineDecoder::new(),
            matcher: AnchorMatcher::with_min_anchors(config.min_anchors),
            range_filter: RangeFilter::new(config.fluctuation_threshold_cm),
            solver: MultilaterationSolver::with_tolerance(config.determinant_tolerance),
            smoother: PositionSmoother::new(config.fluctuation_threshold_cm),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one line against the anchor table valid at call time
    pub fn process_line(&mut self, line: &str, anchors: &AnchorTable) -> LineOutcome {
        let mut report = self.decoder.decode(line).map_err(Diagnostic::from_decode)?;
        let tag_id = report.tag_id;
        let settings = self.config.format(report.format).clone();

        if settings.range_filter && report.format.alignment() == SlotAlignment::IndexAligned {
            let filtered = self.range_filter.apply(tag_id, &report.ranges());
            trace!(tag_id, ?filtered, "range filter applied");
            report.apply_ranges(&filtered);
        }

        let valid = self
            .matcher
            .match_anchors(&report, anchors)
            .map_err(|e| Diagnostic::from_match(tag_id, e))?;
        let anchors_used = valid.anchor_ids();

        let solution = self
            .solver
            .solve(&valid.measurements)
            .map_err(|e| Diagnostic::from_solve(tag_id, anchors_used.clone(), e))?;

        let raw = settings.rounding.apply(solution.position);
        let smoothed = self
            .smoother
            .update(tag_id, raw, settings.smoothing_alpha, settings.rounding);

        debug!(
            tag_id,
            raw_x = raw.x,
            raw_y = raw.y,
            x = smoothed.position.x,
            y = smoothed.position.y,
            step = ?smoothed.step,
            "position solved"
        );

        Ok(PositionEstimate {
            tag_id,
            x: smoothed.position.x,
            y: smoothed.position.y,
            format: report.format,
            ranges_used: valid
                .measurements
                .iter()
                .map(|m| (m.anchor_id, m.range))
                .collect(),
            anchors_used,
        })
    }

    /// Like [`process_line`](Self::process_line), emitting successful
    /// positions to `sink`
    pub fn process_line_with<S: PositionSink + ?Sized>(
        &mut self,
        line: &str,
        anchors: &AnchorTable,
        sink: &mut S,
    ) -> LineOutcome {
        let outcome = self.process_line(line, anchors);
        if let Ok(estimate) = &outcome {
            sink.emit(estimate.tag_id, estimate.x, estimate.y, &estimate.anchors_used);
        }
        outcome
    }

    /// Drop all per-tag state, e.g. after the serial port reconnects
    pub fn reset(&mut self) {
        self.range_filter.clear();
        self.smoother.clear();
    }

    pub fn forget_tag(&mut self, tag_id: TagId) {
        self.range_filter.forget(tag_id);
        self.smoother.forget(tag_id);
    }

    /// Change the fluctuation threshold used by both the range filter and
    /// the dead zone. Returns the previous value.
    pub fn set_fluctuation_threshold(&mut self, threshold_cm: f64) -> Result<f64, ConfigError> {
        let threshold_cm = validate_threshold(threshold_cm)?;
        let old = self.config.fluctuation_threshold_cm;
        self.config.fluctuation_threshold_cm = threshold_cm;
        self.range_filter.set_threshold(threshold_cm);
        self.smoother.set_threshold(threshold_cm);
        Ok(old)
    }
}
