//! Solver statistics and floating-point comparison helpers.

pub mod convergence;
pub mod precision;
