//! Statistics reported by the iterative solver driver.

use crate::criteria::CalculationStatus;

#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
    /// Status of the stop criteria when the loop ended.
    pub status: CalculationStatus,
}
