//! Iteration budget.

use crate::core::traits::Scalar;
use crate::criteria::{CalculationStatus, CriterionKind, IterationState, StopCriterion};
use crate::error::KError;

/// Stops the calculation once the iteration number reaches `max_iterations`.
#[derive(Debug)]
pub struct IterationCountCriterion {
    max_iterations: usize,
    status: CalculationStatus,
}

impl IterationCountCriterion {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations, status: CalculationStatus::Indeterminate }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl<T: Scalar> StopCriterion<T> for IterationCountCriterion {
    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError> {
        self.status = if state.iteration() >= self.max_iterations {
            log::debug!("iteration budget of {} exhausted", self.max_iterations);
            CalculationStatus::StoppedWithoutConvergence
        } else {
            CalculationStatus::Running
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
        Box::new(IterationCountCriterion::new(self.max_iterations))
    }

    fn kind(&self) -> CriterionKind {
        CriterionKind::IterationCount
    }
}
