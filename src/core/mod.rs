//! Core numeric traits and their implementations for faer matrices and Rust vectors.

pub mod traits;
pub mod wrappers;
