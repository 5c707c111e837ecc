//! kryst-control: stop criteria and incomplete-LU preconditioning for Krylov solvers
//!
//! This crate decides, at every iteration of an iterative linear solver, whether to keep
//! iterating, declare convergence, declare failure, or give up, and it provides
//! preconditioners (identity, Jacobi, ILU(0)) that accelerate convergence.

pub mod config;
pub mod core;
pub mod criteria;
pub mod error;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use criteria::*;
pub use error::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
