//! Element-delta test on successive solutions.

use crate::core::traits::Scalar;
use crate::criteria::{CalculationStatus, CriterionKind, IterationState, StopCriterion};
use crate::error::KError;

/// Converges once no solution entry moves by more than `tolerance` between
/// two consecutive evaluations.
///
/// The first evaluation after construction or reset only records the solution.
#[derive(Debug)]
pub struct DeltaCriterion<T> {
    tolerance: T,
    previous: Vec<T>,
    status: CalculationStatus,
}

impl<T: Scalar> DeltaCriterion<T> {
    pub fn new(tolerance: T) -> Result<Self, KError> {
        if !(tolerance.is_finite() && tolerance >= T::zero()) {
            return Err(KError::InvalidParameter(format!(
                "delta tolerance must be non-negative and finite, got {tolerance:?}"
            )));
        }
        Ok(Self { tolerance, previous: Vec::new(), status: CalculationStatus::Indeterminate })
    }

    pub fn tolerance(&self) -> T {
        self.tolerance
    }
}

impl<T: Scalar> StopCriterion<T> for DeltaCriterion<T> {
    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError> {
        let x = state.solution();
        self.status = if self.previous.len() != x.len() {
            CalculationStatus::Running
        } else {
            let delta = self
                .previous
                .iter()
                .zip(x)
                .map(|(&p, &xi)| (xi - p).abs())
                .fold(T::zero(), |acc, d| if d.is_nan() || d > acc { d } else { acc });
            if !delta.is_finite() {
                CalculationStatus::Failed
            } else if delta <= self.tolerance {
                CalculationStatus::Converged
            } else {
                CalculationStatus::Running
            }
        };
        self.previous.clear();
        self.previous.extend_from_slice(x);
        Ok(self.status)
    }

    fn status(&self) -> CalculationStatus {
        self.status
    }

    fn reset(&mut self) {
        self.previous.clear();
        self.status = CalculationStatus::Indeterminate;
    }

    fn clone_criterion(&self) -> Box<dyn StopCriterion<T>> {
        Box::new(DeltaCriterion {
            tolerance: self.tolerance,
            previous: Vec::new(),
            status: CalculationStatus::Indeterminate,
        })
    }

    fn kind(&self) -> CriterionKind {
        CriterionKind::Delta
    }
}
