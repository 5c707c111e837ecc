//! Divergence detection from the residual norm history.
//!
//! The residual is considered diverging when, over the last
//! `minimum_iterations` evaluations, every step increased the residual norm by
//! at least `maximum_relative_increase` (relative to the previous norm).
//! Divergence is reported as [`CalculationStatus::Failed`].

use std::collections::VecDeque;

use crate::core::traits::{InnerProduct, Scalar};
use crate::criteria::{CalculationStatus, CriterionKind, IterationState, StopCriterion};
use crate::error::KError;

const DEFAULT_MAXIMUM_RELATIVE_INCREASE: f64 = 0.08;
const DEFAULT_MINIMUM_ITERATIONS: usize = 10;
const MINIMUM_HISTORY: usize = 3;

#[derive(Debug)]
pub struct DivergenceCriterion<T> {
    maximum_relative_increase: T,
    minimum_iterations: usize,
    history: VecDeque<T>,
    status: CalculationStatus,
}

impl<T: Scalar> DivergenceCriterion<T> {
    pub fn new(maximum_relative_increase: T, minimum_iterations: usize) -> Result<Self, KError> {
        if !(maximum_relative_increase.is_finite() && maximum_relative_increase > T::zero()) {
            return Err(KError::InvalidParameter(format!(
                "maximum relative increase must be positive and finite, got {maximum_relative_increase:?}"
            )));
        }
        if minimum_iterations < MINIMUM_HISTORY {
            return Err(KError::InvalidParameter(format!(
                "divergence needs at least {MINIMUM_HISTORY} iterations of history, got {minimum_iterations}"
            )));
        }
        Ok(Self {
            maximum_relative_increase,
            minimum_iterations,
            history: VecDeque::with_capacity(minimum_iterations),
            status: CalculationStatus::Indeterminate,
        })
    }

    pub fn maximum_relative_increase(&self) -> T {
        self.maximum_relative_increase
    }

    pub fn minimum_iterations(&self) -> usize {
        self.minimum_iterations
    }

    fn is_diverging(&self) -> bool {
        self.history
            .iter()
            .zip(self.history.iter().skip(1))
            .all(|(&prev, &next)| {
                prev > T::zero() && (next - prev) / prev >= self.maximum_relative_increase
            })
    }
}

impl<T: Scalar> Default for DivergenceCriterion<T> {
    /// 8% growth per iteration sustained over 10 iterations.
    fn default() -> Self {
        Self {
            maximum_relative_increase: T::from(DEFAULT_MAXIMUM_RELATIVE_INCREASE)
                .unwrap_or_else(T::epsilon),
            minimum_iterations: DEFAULT_MINIMUM_ITERATIONS,
            history: VecDeque::with_capacity(DEFAULT_MINIMUM_ITERATIONS),
            status: CalculationStatus::Indeterminate,
        }
    }
}

impl<T: Scalar> StopCriterion<T> for DivergenceCriterion<T> {
    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError> {
        let r_norm = ().norm(state.residual());
        if !r_norm.is_finite() {
            self.history.clear();
            self.status = CalculationStatus::Failed;
            return Ok(self.status);
        }
        if self.history.len() == self.minimum_iterations {
            self.history.pop_front();
        }
        self.history.push_back(r_norm);
        self.status = if self.history.len() == self.minimum_iterations && self.is_diverging() {
            log::debug!(
                "residual grew by at least {:?} per step over {} iterations (now {r_norm:?})",
                self.maximum_relative_increase,
                self.minimum_iterations
            );
            CalculationStatus::Failed
        } else {
            CalculationStatus::Running
        };
        Ok(self.status)
    }

    fn status(&self) -> CalculationStatus {
        self.status
    }

    fn reset(&mut self) {
        self.history.clear();
        self.status = CalculationStatus::Indeterminate;
    }

    fn clone_criterion(&self) -> Box<dyn StopCriterion<T>> {
        Box::new(DivergenceCriterion {
            maximum_relative_increase: self.maximum_relative_increase,
            minimum_iterations: self.minimum_iterations,
            history: VecDeque::with_capacity(self.minimum_iterations),
            status: CalculationStatus::Indeterminate,
        })
    }

    fn kind(&self) -> CriterionKind {
        CriterionKind::Divergence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(c: &mut DivergenceCriterion<f64>, norms: &[f64]) -> CalculationStatus {
        let x = [0.0];
        let mut last = CalculationStatus::Indeterminate;
        for (i, &r) in norms.iter().enumerate() {
            last = c
                .determine_status(i as isize, Some(&x[..]), Some(&x[..]), Some(&[r][..]))
                .unwrap();
        }
        last
    }

    #[test]
    fn steady_growth_fails() {
        let mut c = DivergenceCriterion::new(0.1, 4).unwrap();
        assert_eq!(feed(&mut c, &[1.0, 1.2, 1.5]), CalculationStatus::Running);
        assert_eq!(feed(&mut c, &[2.0]), CalculationStatus::Failed);
    }

    #[test]
    fn one_flat_step_is_not_divergence() {
        let mut c = DivergenceCriterion::new(0.1, 4).unwrap();
        assert_eq!(feed(&mut c, &[1.0, 1.5, 1.5, 2.0]), CalculationStatus::Running);
    }

    #[test]
    fn history_window_slides() {
        let mut c = DivergenceCriterion::new(0.1, 3).unwrap();
        // decreasing first, then three growing norms
        assert_eq!(feed(&mut c, &[5.0, 1.0, 2.0, 4.0]), CalculationStatus::Failed);
    }

    #[test]
    fn reset_forgets_history() {
        let mut c = DivergenceCriterion::new(0.1, 3).unwrap();
        feed(&mut c, &[1.0, 2.0]);
        c.reset();
        assert_eq!(StopCriterion::<f64>::status(&c), CalculationStatus::Indeterminate);
        assert_eq!(feed(&mut c, &[4.0]), CalculationStatus::Running);
    }

    #[test]
    fn huge_finite_residual_keeps_running() {
        let mut c = DivergenceCriterion::<f64>::default();
        let x = [1.0, 1.0];
        let b = [1e300, 1e300];
        let s = c
            .determine_status(0, Some(&x[..]), Some(&b[..]), Some(&[1e200, 1e200][..]))
            .unwrap();
        assert_eq!(s, CalculationStatus::Running);
    }

    #[test]
    fn rejects_short_window() {
        assert!(matches!(DivergenceCriterion::new(0.1, 2), Err(KError::InvalidParameter(_))));
    }

    #[test]
    fn default_parameters() {
        let c = DivergenceCriterion::<f64>::default();
        assert_eq!(c.minimum_iterations(), 10);
        assert!((c.maximum_relative_increase() - 0.08).abs() < 1e-15);
    }
}
