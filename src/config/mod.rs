//! Configuration of stop criteria and preconditioners.

pub mod options;
pub use options::{DivergenceOptions, PcType, SolverOptions};
