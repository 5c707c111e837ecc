//! Residual-norm convergence test.

use crate::core::traits::{InnerProduct, Scalar};
use crate::criteria::{CalculationStatus, CriterionKind, IterationState, StopCriterion};
use crate::error::KError;

/// How the residual norm is compared against the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidualNorm {
    /// ‖r‖₂ ≤ tol
    Absolute,
    /// ‖r‖₂ ≤ tol · ‖b‖₂, falling back to absolute when ‖b‖₂ = 0.
    #[default]
    Relative,
}

/// Declares convergence once the residual norm stays below the tolerance.
///
/// With `minimum_iterations_below = k` the residual has to be below the
/// threshold for `k + 1` consecutive evaluations. A non-finite residual norm
/// fails the calculation.
#[derive(Debug)]
pub struct ResidualCriterion<T> {
    tolerance: T,
    minimum_iterations_below: usize,
    norm: ResidualNorm,
    below_count: usize,
    status: CalculationStatus,
}

impl<T: Scalar> ResidualCriterion<T> {
    /// Relative residual test with the given tolerance.
    pub fn new(tolerance: T) -> Result<Self, KError> {
        if !(tolerance.is_finite() && tolerance > T::zero()) {
            return Err(KError::InvalidParameter(format!(
                "residual tolerance must be positive and finite, got {tolerance:?}"
            )));
        }
        Ok(Self {
            tolerance,
            minimum_iterations_below: 0,
            norm: ResidualNorm::Relative,
            below_count: 0,
            status: CalculationStatus::Indeterminate,
        })
    }

    pub fn with_norm(mut self, norm: ResidualNorm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_minimum_iterations_below(mut self, count: usize) -> Self {
        self.minimum_iterations_below = count;
        self
    }

    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    pub fn minimum_iterations_below(&self) -> usize {
        self.minimum_iterations_below
    }

    pub fn norm(&self) -> ResidualNorm {
        self.norm
    }

    fn threshold(&self, source: &[T]) -> T {
        match self.norm {
            ResidualNorm::Absolute => self.tolerance,
            ResidualNorm::Relative => {
                let b_norm = ().norm(source);
                if b_norm > T::zero() && b_norm.is_finite() {
                    self.tolerance * b_norm
                } else {
                    self.tolerance
                }
            }
        }
    }
}

impl<T: Scalar> StopCriterion<T> for ResidualCriterion<T> {
    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError> {
        let r_norm = ().norm(state.residual());
        self.status = if !r_norm.is_finite() {
            self.below_count = 0;
            CalculationStatus::Failed
        } else if r_norm <= self.threshold(state.source()) {
            self.below_count += 1;
            if self.below_count > self.minimum_iterations_below {
                CalculationStatus::Converged
            } else {
                CalculationStatus::Running
            }
        } else {
            self.below_count = 0;
            CalculationStatus::Running
        };
        log::trace!(
            "residual norm {r_norm:?} at iteration {}: {}",
            state.iteration(),
            self.status
        );
        Ok(self.status)
    }

    fn status(&self) -> CalculationStatus {
        self.status
    }

    fn reset(&mut self) {
        self.below_count = 0;
        self.status = CalculationStatus::Indeterminate;
    }

    fn clone_criterion(&self) -> Box<dyn StopCriterion<T>> {
        Box::new(ResidualCriterion {
            tolerance: self.tolerance,
            minimum_iterations_below: self.minimum_iterations_below,
            norm: self.norm,
            below_count: 0,
            status: CalculationStatus::Indeterminate,
        })
    }

    fn kind(&self) -> CriterionKind {
        CriterionKind::Residual
    }
}
