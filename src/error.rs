use thiserror::Error;

// Unified error type for kryst-control

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KError {
    #[error("iteration number {0} is out of range (must be non-negative)")]
    IterationOutOfRange(isize),
    #[error("missing input: {0}")]
    MissingInput(&'static str),
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("vectors must have positive length")]
    EmptyInput,
    #[error("matrix is not square ({nrows}x{ncols})")]
    NotSquare { nrows: usize, ncols: usize },
    #[error("preconditioner used before setup")]
    NotInitialized,
    #[error("zero pivot at row {0}")]
    ZeroPivot(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid sparse structure: {0}")]
    InvalidStructure(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
