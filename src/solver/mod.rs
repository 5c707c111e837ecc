//! Iterative solver driven by stop criteria and a preconditioner.

use crate::preconditioner::Preconditioner;
use crate::utils::convergence::SolveStats;

/// Common interface for iterative solvers.
pub trait LinearSolver<M, V> {
    type Error;
    type Scalar: Copy + PartialOrd;
    /// Solve A·x = b, writing result into `x` (which also holds the initial guess).
    /// Returns iteration stats (including the final criteria status).
    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<Self::Scalar>, Self::Error>;
}

pub mod bicgstab;
pub use bicgstab::BiCgStabSolver;
