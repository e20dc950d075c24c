//! Linearized least-squares multilateration in the plane
//!
//! The anchor with the smallest positive range is taken as the reference.
//! Subtracting its circle equation from every other anchor's circle equation
//! gives one linear equation per remaining anchor:
//!
//! ```text
//! 2(xi - xr)·x + 2(yi - yr)·y = rr² - ri² + xi² - xr² + yi² - yr²
//! ```
//!
//! The overdetermined system is solved through its 2×2 normal equations.

use crate::core::{Coordinate, RangeMeasurement, DEFAULT_DETERMINANT_TOLERANCE, MIN_ANCHORS};
use nalgebra::{Matrix2, Point2, Vector2};
use thiserror::Error;

/// Expected ways a solve can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("need at least {required} measurements, got {available}")]
    InsufficientMeasurements { available: usize, required: usize },
    /// Anchors are (near) collinear as seen from the reference anchor
    #[error("degenerate anchor geometry (determinant {determinant:e})")]
    DegenerateGeometry { determinant: f64 },
    /// Ranges too large for double precision produced a non-finite position
    #[error("solution is not finite (determinant {determinant:e})")]
    NonFiniteSolution { determinant: f64 },
}

/// Solver output with the diagnostics of the normal equations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub position: Coordinate,
    /// Index into the input slice of the reference anchor
    pub reference_index: usize,
    pub determinant: f64,
}

/// 2-D position solver from anchor ranges
#[derive(Debug, Clone)]
pub struct MultilaterationSolver {
    /// Minimum |det| of the normal matrix accepted as solvable
    pub determinant_tolerance: f64,
}

impl Default for MultilaterationSolver {
    fn default() -> Self {
        Self {
            determinant_tolerance: DEFAULT_DETERMINANT_TOLERANCE,
        }
    }
}

impl MultilaterationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(determinant_tolerance: f64) -> Self {
        Self { determinant_tolerance }
    }

    /// Estimate the tag position from three or more measurements
    pub fn solve(&self, measurements: &[RangeMeasurement]) -> Result<Solution, SolveError> {
        if measurements.len() < MIN_ANCHORS {
            return Err(SolveError::InsufficientMeasurements {
                available: measurements.len(),
                required: MIN_ANCHORS,
            });
        }

        let reference_index = select_reference(measurements);
        let reference = &measurements[reference_index];
        let (xr, yr, rr) = (reference.position.x, reference.position.y, reference.range);

        let mut normal = Matrix2::<f64>::zeros();
        let mut rhs = Vector2::<f64>::zeros();

        for (i, m) in measurements.iter().enumerate() {
            if i == reference_index {
                continue;
            }
            let (xi, yi, ri) = (m.position.x, m.position.y, m.range);
            let row = Vector2::new(2.0 * (xi - xr), 2.0 * (yi - yr));
            let b = rr * rr - ri * ri + xi * xi - xr * xr + yi * yi - yr * yr;

            normal += row * row.transpose();
            rhs += row * b;
        }

        let (a11, a12, a22) = (normal[(0, 0)], normal[(0, 1)], normal[(1, 1)]);
        let determinant = a11 * a22 - a12 * a12;
        if determinant.abs() < self.determinant_tolerance || !determinant.is_finite() {
            return Err(SolveError::DegenerateGeometry { determinant });
        }

        let (b1, b2) = (rhs.x, rhs.y);
        let x = (a22 * b1 - a12 * b2) / determinant;
        let y = (a11 * b2 - a12 * b1) / determinant;
        if !(x.is_finite() && y.is_finite()) {
            return Err(SolveError::NonFiniteSolution { determinant });
        }

        Ok(Solution {
            position: Point2::new(x, y),
            reference_index,
            determinant,
        })
    }
}

/// Index of the smallest positive range, falling back to the first entry
fn select_reference(measurements: &[RangeMeasurement]) -> usize {
    measurements
        .iter()
        .enumerate()
        .filter(|(_, m)| m.range > 0.0)
        .min_by(|(_, a), (_, b)| a.range.total_cmp(&b.range))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ranged(anchors: &[(f64, f64)], target: (f64, f64)) -> Vec<RangeMeasurement> {
        anchors
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let range = ((x - target.0).powi(2) + (y - target.1).powi(2)).sqrt();
                RangeMeasurement::new(i as u32, x, y, range)
            })
            .collect()
    }

    #[test]
    fn test_exact_ranges_recover_position() {
        let measurements = ranged(&[(0.0, 0.0), (130.0, 0.0), (130.0, 130.0), (0.0, 130.0)], (40.0, 70.0));
        let solution = MultilaterationSolver::new().solve(&measurements).unwrap();

        assert!((solution.position.x - 40.0).abs() < 1e-6);
        assert!((solution.position.y - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_reference_is_nearest_anchor() {
        let measurements = ranged(&[(0.0, 0.0), (500.0, 0.0), (0.0, 500.0)], (480.0, 10.0));
        let solution = MultilaterationSolver::new().solve(&measurements).unwrap();
        assert_eq!(solution.reference_index, 1);
    }

    #[test]
    fn test_zero_range_is_not_reference() {
        let measurements = vec![
            RangeMeasurement::new(0, 0.0, 0.0, 0.0),
            RangeMeasurement::new(1, 100.0, 0.0, 50.0),
            RangeMeasurement::new(2, 0.0, 100.0, 80.0),
        ];
        assert_eq!(select_reference(&measurements), 1);
    }

    #[test]
    fn test_collinear_anchors_are_degenerate() {
        let measurements = ranged(&[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)], (50.0, 40.0));
        let result = MultilaterationSolver::new().solve(&measurements);

        assert!(matches!(result, Err(SolveError::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_duplicate_anchor_degenerates() {
        let measurements = vec![
            RangeMeasurement::new(0, 0.0, 0.0, 50.0),
            RangeMeasurement::new(0, 0.0, 0.0, 52.0),
            RangeMeasurement::new(0, 0.0, 0.0, 49.0),
        ];
        assert!(matches!(
            MultilaterationSolver::new().solve(&measurements),
            Err(SolveError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        let mut measurements = ranged(&[(0.0, 0.0), (130.0, 0.0), (130.0, 130.0)], (40.0, 30.0));
        measurements[2].range = 1e200;

        assert!(matches!(
            MultilaterationSolver::new().solve(&measurements),
            Err(SolveError::NonFiniteSolution { .. })
        ));
    }

    #[test]
    fn test_too_few_measurements() {
        let measurements = ranged(&[(0.0, 0.0), (100.0, 0.0)], (50.0, 40.0));
        assert_eq!(
            MultilaterationSolver::new().solve(&measurements),
            Err(SolveError::InsufficientMeasurements { available: 2, required: 3 })
        );
    }

    #[test]
    fn test_noisy_ranges_stay_close() {
        let mut measurements = ranged(&[(0.0, 0.0), (300.0, 0.0), (300.0, 300.0), (0.0, 300.0)], (120.0, 180.0));
        measurements[0].range += 3.0;
        measurements[2].range -= 2.0;

        let solution = MultilaterationSolver::new().solve(&measurements).unwrap();
        assert!((solution.position.x - 120.0).abs() < 10.0);
        assert!((solution.position.y - 180.0).abs() < 10.0);
    }

    proptest! {
        #[test]
        fn prop_round_trip_non_collinear(
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
            ox in -200.0f64..200.0,
            oy in -200.0f64..200.0,
        ) {
            // right triangle with 400 cm legs, shifted around the plane
            let anchors = [(ox, oy), (ox + 400.0, oy), (ox, oy + 400.0)];
            let target = (tx, ty);
            prop_assume!(anchors.iter().all(|&(x, y)| (x - tx).abs() + (y - ty).abs() > 1e-3));

            let solution = MultilaterationSolver::new().solve(&ranged(&anchors, target)).unwrap();
            prop_assert!((solution.position.x - tx).abs() < 1e-6);
            prop_assert!((solution.position.y - ty).abs() < 1e-6);
        }
    }
}
