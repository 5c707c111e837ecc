//! Core linear-algebra traits for kryst-control.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V: ?Sized> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Transposed matrix–vector product: y ← Aᵀ x.
pub trait MatTransVec<V: ?Sized> {
    /// Compute y = Aᵀ · x.
    fn mattransvec(&self, x: &V, y: &mut V);
}

/// Inner products & norms.
pub trait InnerProduct<V: ?Sized> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}

/// Row/column counts of a matrix.
pub trait MatShape {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    /// True when the matrix has as many rows as columns.
    fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }
}

/// Real scalar usable throughout the crate (`f32`, `f64`).
pub trait Scalar: num_traits::Float + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Scalar for T where T: num_traits::Float + Send + Sync + std::fmt::Debug + 'static {}
