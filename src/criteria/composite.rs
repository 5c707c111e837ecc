//! Ordered combination of stop criteria.
//!
//! Every member is evaluated on every iteration, in registration order, and
//! the member statuses are combined by precedence:
//!
//! 1. `Failed` or `Cancelled` (the first one registered wins),
//! 2. `Converged`,
//! 3. `StoppedWithoutConvergence`,
//! 4. `Running`.
//!
//! A failure is never masked by a looser criterion that still reports
//! `Running` or even `Converged`. The ordering is a design default for
//! iterative solvers; see [`CalculationStatus::precedence`].

use crate::core::traits::Scalar;
use crate::criteria::{CalculationStatus, CriterionKind, IterationState, StopCriterion};
use crate::error::KError;

#[derive(Debug)]
pub struct CompositeCriterion<T> {
    criteria: Vec<Box<dyn StopCriterion<T>>>,
    cancelled: bool,
    status: CalculationStatus,
}

impl<T: Scalar> CompositeCriterion<T> {
    pub fn new() -> Self {
        Self { criteria: Vec::new(), cancelled: false, status: CalculationStatus::Indeterminate }
    }

    /// Failure detection, residual tolerance and iteration budget, the usual trio.
    pub fn with_defaults(tolerance: T, max_iterations: usize) -> Result<Self, KError> {
        Ok(Self::new()
            .with(crate::criteria::FailureCriterion::new())
            .with(crate::criteria::ResidualCriterion::new(tolerance)?)
            .with(crate::criteria::IterationCountCriterion::new(max_iterations)))
    }

    /// Append a criterion; evaluation follows registration order.
    pub fn with<C: StopCriterion<T> + 'static>(mut self, criterion: C) -> Self {
        self.push(Box::new(criterion));
        self
    }

    pub fn push(&mut self, criterion: Box<dyn StopCriterion<T>>) {
        self.criteria.push(criterion);
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Member criteria in registration order.
    pub fn criteria(&self) -> impl Iterator<Item = &dyn StopCriterion<T>> {
        self.criteria.iter().map(|c| c.as_ref())
    }

    /// Abort the calculation from outside the solver loop.
    ///
    /// The composite reports `Cancelled` until it is reset.
    pub fn cancel(&mut self) {
        log::debug!("calculation cancelled");
        self.cancelled = true;
        self.status = CalculationStatus::Cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl<T: Scalar> Default for CompositeCriterion<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> StopCriterion<T> for CompositeCriterion<T> {
    /// Empty composites, at any nesting depth, cannot decide anything.
    fn validate_configuration(&self) -> Result<(), KError> {
        if self.criteria.is_empty() {
            return Err(KError::MissingInput("stop criteria"));
        }
        self.criteria.iter().try_for_each(|c| c.validate_configuration())
    }

    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError> {
        // members are only touched once the whole tree is known to evaluate
        self.validate_configuration()?;
        if self.cancelled {
            self.status = CalculationStatus::Cancelled;
            return Ok(self.status);
        }
        let mut combined = CalculationStatus::Running;
        for criterion in self.criteria.iter_mut() {
            let s = criterion.evaluate(state)?;
            if s.precedence() > combined.precedence() {
                combined = s;
            }
        }
        if combined != self.status {
            log::debug!(
                "status {} -> {} at iteration {}",
                self.status,
                combined,
                state.iteration()
            );
        }
        self.status = combined;
        Ok(self.status)
    }

    fn status(&self) -> CalculationStatus {
        self.status
    }

    fn reset(&mut self) {
        for criterion in self.criteria.iter_mut() {
            criterion.reset();
        }
        self.cancelled = false;
        self.status = CalculationStatus::Indeterminate;
    }

    fn clone_criterion(&self) -> Box<dyn StopCriterion<T>> {
        Box::new(CompositeCriterion {
            criteria: self.criteria.iter().map(|c| c.clone_criterion()).collect(),
            cancelled: false,
            status: CalculationStatus::Indeterminate,
        })
    }

    fn kind(&self) -> CriterionKind {
        CriterionKind::Composite
    }
}
