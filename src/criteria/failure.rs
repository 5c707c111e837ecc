//! Numeric breakdown detector.
//!
//! A norm-based test on a vector holding NaN is meaningless, so this criterion
//! looks at the raw coordinates: any NaN or infinite entry in the solution or
//! the residual fails the calculation. It never reports convergence.

use crate::core::traits::Scalar;
use crate::criteria::{CalculationStatus, CriterionKind, IterationState, StopCriterion};
use crate::error::KError;

/// Fails the calculation as soon as the solution or residual holds a non-finite value.
#[derive(Debug, Default)]
pub struct FailureCriterion {
    status: CalculationStatus,
}

impl FailureCriterion {
    pub fn new() -> Self {
        Self { status: CalculationStatus::Indeterminate }
    }
}

/// Index of the first NaN/Infinity in `v`.
fn first_non_finite<T: Scalar>(v: &[T]) -> Option<usize> {
    v.iter().position(|x| !x.is_finite())
}

impl<T: Scalar> StopCriterion<T> for FailureCriterion {
    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError> {
        let bad = first_non_finite(state.residual())
            .map(|i| ("residual", i))
            .or_else(|| first_non_finite(state.solution()).map(|i| ("solution", i)));
        self.status = match bad {
            Some((name, i)) => {
                log::debug!(
                    "non-finite {name} entry at index {i} in iteration {}",
                    state.iteration()
                );
                CalculationStatus::Failed
            }
            None => CalculationStatus::Running,
        };
        Ok(self.status)
    }

    fn status(&self) -> CalculationStatus {
        self.status
    }

    fn reset(&mut self) {
        self.status = CalculationStatus::Indeterminate;
    }

    fn clone_criterion(&self) -> Box<dyn StopCriterion<T>> {
        Box::new(FailureCriterion::new())
    }

    fn kind(&self) -> CriterionKind {
        CriterionKind::Failure
    }
}
