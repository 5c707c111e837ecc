//! Matrix module: CSR sparse matrix container.

pub mod sparse;
pub use sparse::CsrMatrix;
