//! Preconditioners for linear solvers.
//!
//! This module defines the Preconditioner trait and includes the identity,
//! Jacobi and zero-fill incomplete LU preconditioners.

use crate::error::KError;

/// A preconditioner M ≈ A⁻¹.
///
/// `setup` is called once with the system matrix; `apply` may then be called
/// any number of times within a solve.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError>;
    /// Setup/factorize from A. Calling it again replaces the previous state.
    fn setup(&mut self, a: &M) -> Result<(), KError>;
    /// Apply M⁻ᵀ to r, writing z = M⁻ᵀ r
    fn apply_transpose(&self, _r: &V, _z: &mut V) -> Result<(), KError> {
        Err(KError::Unsupported("transposed preconditioner application"))
    }
}

/// Check the vector lengths of an application against the operator dimension.
pub(crate) fn check_apply_dims(n: usize, r: usize, z: usize) -> Result<(), KError> {
    if r != n {
        return Err(KError::DimensionMismatch { expected: n, found: r });
    }
    if z != n {
        return Err(KError::DimensionMismatch { expected: n, found: z });
    }
    Ok(())
}

pub(crate) fn check_square(nrows: usize, ncols: usize) -> Result<(), KError> {
    if nrows != ncols {
        return Err(KError::NotSquare { nrows, ncols });
    }
    Ok(())
}

// Submodules for the supported preconditioners
pub mod identity;
pub mod ilu;
pub mod jacobi;

// Re-exports for convenience
pub use identity::Identity;
pub use ilu::Ilu0;
pub use jacobi::Jacobi;
