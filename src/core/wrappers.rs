//! `faer::Mat` and slice implementations of the core traits.
//!
//! Dense matrices get products and shape queries so that the BiCGStab driver
//! and the preconditioners accept them next to `CsrMatrix`. Slices get the
//! inner product used by the residual and divergence criteria; with the
//! `rayon` feature the reductions run in parallel.
//!
//! # References
//! - [faer crate documentation](https://docs.rs/faer)

use crate::core::traits::{InnerProduct, MatShape, MatTransVec, MatVec};
use faer::Mat;
use num_traits::Float;

/// y = A x for a dense matrix.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.ncols(), x.len(), "x has {} entries, A has {} columns", x.len(), self.ncols());
        assert_eq!(self.nrows(), y.len(), "y has {} entries, A has {} rows", y.len(), self.nrows());
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = x
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (j, &xj)| acc + self[(i, j)] * xj);
        }
    }
}

/// y = Aᵀ x for a dense matrix.
impl<T: Float> MatTransVec<Vec<T>> for Mat<T> {
    fn mattransvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), x.len(), "x has {} entries, A has {} rows", x.len(), self.nrows());
        assert_eq!(self.ncols(), y.len(), "y has {} entries, A has {} columns", y.len(), self.ncols());
        for (j, yj) in y.iter_mut().enumerate() {
            *yj = x
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (i, &xi)| acc + self[(i, j)] * xi);
        }
    }
}

impl<T> MatShape for Mat<T> {
    fn nrows(&self) -> usize {
        Mat::nrows(self)
    }
    fn ncols(&self) -> usize {
        Mat::ncols(self)
    }
}

#[cfg(feature = "rayon")]
fn sum_of_products<T: Float + Send + Sync>(x: &[T], y: &[T]) -> T {
    use rayon::prelude::*;
    x.par_iter()
        .zip(y.par_iter())
        .map(|(&a, &b)| a * b)
        .reduce(T::zero, |acc, v| acc + v)
}

#[cfg(not(feature = "rayon"))]
fn sum_of_products<T: Float>(x: &[T], y: &[T]) -> T {
    x.iter().zip(y).fold(T::zero(), |acc, (&a, &b)| acc + a * b)
}

/// Larger of two magnitudes; NaN wins.
fn max_magnitude<T: Float>(m: T, a: T) -> T {
    if a.is_nan() || a > m { a } else { m }
}

#[cfg(feature = "rayon")]
fn max_abs<T: Float + Send + Sync>(x: &[T]) -> T {
    use rayon::prelude::*;
    x.par_iter().map(|v| v.abs()).reduce(T::zero, max_magnitude)
}

#[cfg(not(feature = "rayon"))]
fn max_abs<T: Float>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |m, v| max_magnitude(m, v.abs()))
}

#[cfg(feature = "rayon")]
fn sum_of_scaled_squares<T: Float + Send + Sync>(x: &[T], scale: T) -> T {
    use rayon::prelude::*;
    x.par_iter()
        .map(|&v| {
            let s = v / scale;
            s * s
        })
        .reduce(T::zero, |acc, v| acc + v)
}

#[cfg(not(feature = "rayon"))]
fn sum_of_scaled_squares<T: Float>(x: &[T], scale: T) -> T {
    x.iter().fold(T::zero(), |acc, &v| {
        let s = v / scale;
        acc + s * s
    })
}

/// Euclidean inner product on slices; `()` is the stateless context.
impl<T: Float + Send + Sync> InnerProduct<[T]> for () {
    type Scalar = T;

    fn dot(&self, x: &[T], y: &[T]) -> T {
        assert_eq!(x.len(), y.len(), "dot product of slices with different lengths");
        sum_of_products(x, y)
    }

    /// Scaled by the largest magnitude before squaring (as BLAS `nrm2`), so
    /// finite vectors near the overflow or underflow range keep a finite,
    /// nonzero norm. Non-finite entries propagate into the norm.
    fn norm(&self, x: &[T]) -> T {
        let scale = max_abs(x);
        if scale == T::zero() || !scale.is_finite() {
            return scale;
        }
        scale * sum_of_scaled_squares(x, scale).sqrt()
    }
}
