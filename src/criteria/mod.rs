//! Stop criteria for iterative solvers.
//!
//! A stop criterion is queried once per solver iteration with the current
//! iterate, the right-hand side and the residual, and answers with a
//! [`CalculationStatus`]. Criteria are independent and pluggable; a
//! [`CompositeCriterion`] combines several of them with a fixed precedence.
//!
//! # Provided criteria
//! - [`FailureCriterion`]: NaN/Infinity detection in solution or residual.
//! - [`ResidualCriterion`]: residual norm below a (relative or absolute) tolerance.
//! - [`IterationCountCriterion`]: iteration budget.
//! - [`DivergenceCriterion`]: steadily growing residual norm.
//! - [`DeltaCriterion`]: largest element change between successive solutions.
//!
//! # Lifecycle
//! Criteria are created `Indeterminate`, evaluated every iteration, reset with
//! [`StopCriterion::reset`] between independent solves, and duplicated with
//! [`StopCriterion::clone_criterion`], which yields a fresh instance with the
//! same parameters.

use crate::error::KError;

pub mod composite;
pub mod delta;
pub mod divergence;
pub mod failure;
pub mod iteration;
pub mod residual;
pub mod status;

pub use composite::CompositeCriterion;
pub use delta::DeltaCriterion;
pub use divergence::DivergenceCriterion;
pub use failure::FailureCriterion;
pub use iteration::IterationCountCriterion;
pub use residual::{ResidualCriterion, ResidualNorm};
pub use status::CalculationStatus;

/// Concrete variant of a stop criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionKind {
    Failure,
    Residual,
    IterationCount,
    Divergence,
    Delta,
    Composite,
}

/// Validated inputs of one status determination.
///
/// All three vectors share the same, positive length.
#[derive(Debug, Clone, Copy)]
pub struct IterationState<'a, T> {
    iteration: usize,
    solution: &'a [T],
    source: &'a [T],
    residual: &'a [T],
}

impl<'a, T> IterationState<'a, T> {
    /// Check the arguments of a status determination.
    ///
    /// Errors, in order of checking: negative iteration number, absent vector,
    /// vectors of differing length, empty vectors.
    pub fn new(
        iteration: isize,
        solution: Option<&'a [T]>,
        source: Option<&'a [T]>,
        residual: Option<&'a [T]>,
    ) -> Result<Self, KError> {
        if iteration < 0 {
            return Err(KError::IterationOutOfRange(iteration));
        }
        let solution = solution.ok_or(KError::MissingInput("solution"))?;
        let source = source.ok_or(KError::MissingInput("source"))?;
        let residual = residual.ok_or(KError::MissingInput("residual"))?;
        let n = solution.len();
        for v in [source, residual] {
            if v.len() != n {
                return Err(KError::DimensionMismatch { expected: n, found: v.len() });
            }
        }
        if n == 0 {
            return Err(KError::EmptyInput);
        }
        Ok(Self { iteration: iteration as usize, solution, source, residual })
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn solution(&self) -> &'a [T] {
        self.solution
    }

    pub fn source(&self) -> &'a [T] {
        self.source
    }

    pub fn residual(&self) -> &'a [T] {
        self.residual
    }

    /// Common vector length.
    pub fn dimension(&self) -> usize {
        self.solution.len()
    }
}

/// A pluggable convergence test run once per solver iteration.
pub trait StopCriterion<T>: std::fmt::Debug {
    /// Validate the iterate, then compute, store and return the new status.
    fn determine_status(
        &mut self,
        iteration: isize,
        solution: Option<&[T]>,
        source: Option<&[T]>,
        residual: Option<&[T]>,
    ) -> Result<CalculationStatus, KError> {
        let state = IterationState::new(iteration, solution, source, residual)?;
        self.evaluate(&state)
    }

    /// Report a criterion that cannot evaluate any iterate.
    ///
    /// Runs before any state changes, so containers can reject a bad member
    /// without leaving earlier members half updated. `evaluate` should not
    /// fail once this returns `Ok`.
    fn validate_configuration(&self) -> Result<(), KError> {
        Ok(())
    }

    /// Compute and store the status for an already validated iterate.
    fn evaluate(&mut self, state: &IterationState<'_, T>) -> Result<CalculationStatus, KError>;

    /// Status stored by the last evaluation.
    fn status(&self) -> CalculationStatus;

    /// Return to the pre-calculation (`Indeterminate`) state. Idempotent.
    fn reset(&mut self);

    /// Fresh instance of the same kind and parameters, `Indeterminate`.
    fn clone_criterion(&self) -> Box<dyn StopCriterion<T>>;

    fn kind(&self) -> CriterionKind;
}

/// Cloning a boxed criterion yields a reset copy, see [`StopCriterion::clone_criterion`].
impl<T> Clone for Box<dyn StopCriterion<T>> {
    fn clone(&self) -> Self {
        self.clone_criterion()
    }
}
