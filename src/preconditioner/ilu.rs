//! ILU(0) factorization with zero fill (Saad §10.3).
//!
//! The factorization runs the IKJ variant of Gaussian elimination on a copy of
//! the CSR values. Only positions stored in the input pattern are updated;
//! fill-in is discarded. Explicitly stored zeros belong to the pattern and are
//! updated like any other entry.
//!
//! # Factors
//! - `L`: strictly lower part holding the multipliers; its unit diagonal is
//!   implicit and not stored.
//! - `U`: diagonal and upper part; the diagonal is the first entry of each row.
//!
//! `L·U` reproduces the input at every position of its pattern.
//!
//! # Breakdown
//! A missing diagonal entry or a pivot with `|u_kk| <= pivot_tolerance · max_j |a_kj|`
//! aborts `setup` with [`KError::ZeroPivot`]. Application never divides by a
//! pivot that was not checked.
//!
//! # References
//! - Saad, Y. (2003). Iterative Methods for Sparse Linear Systems, Algorithm 10.4.

use crate::core::traits::Scalar;
use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::{check_apply_dims, check_square, Preconditioner};
use faer::Mat;

const UNSET: usize = usize::MAX;

#[derive(Debug, Clone)]
struct IluFactors<T> {
    l: CsrMatrix<T>,
    u: CsrMatrix<T>,
}

/// Incomplete LU preconditioner with zero fill-in.
#[derive(Debug, Clone)]
pub struct Ilu0<T> {
    pivot_tolerance: T,
    factors: Option<IluFactors<T>>,
}

impl<T: Scalar> Ilu0<T> {
    /// Uses `T::epsilon()` as relative pivot tolerance.
    pub fn new() -> Self {
        Self { pivot_tolerance: T::epsilon(), factors: None }
    }

    /// Pivots at or below `tol` times the largest magnitude of their row are
    /// treated as zero. `tol` must be finite and non-negative; zero still
    /// rejects exact zero pivots.
    pub fn with_pivot_tolerance(mut self, tol: T) -> Result<Self, KError> {
        if !(tol.is_finite() && tol >= T::zero()) {
            return Err(KError::InvalidParameter(format!(
                "pivot tolerance must be non-negative and finite, got {tol:?}"
            )));
        }
        self.pivot_tolerance = tol;
        Ok(self)
    }

    pub fn pivot_tolerance(&self) -> T {
        self.pivot_tolerance
    }

    pub fn is_initialized(&self) -> bool {
        self.factors.is_some()
    }

    /// Dimension of the factored matrix, if any.
    pub fn dim(&self) -> Option<usize> {
        self.factors.as_ref().map(|f| f.u.nrows())
    }

    /// Compute the L and U factors of `a`.
    pub fn initialize(&mut self, a: &CsrMatrix<T>) -> Result<(), KError> {
        check_square(a.nrows(), a.ncols())?;
        // a failed factorization leaves the preconditioner uninitialized
        self.factors = None;
        let n = a.nrows();
        let row_ptr = a.row_ptr();
        let col_idx = a.col_idx();
        let mut vals = a.values().to_vec();

        let mut diag = vec![UNSET; n];
        let mut row_scale = vec![T::zero(); n];
        for i in 0..n {
            diag[i] = a.position(i, i).ok_or(KError::ZeroPivot(i))?;
            row_scale[i] = a.row(i).fold(T::zero(), |m, (_, v)| m.max(v.abs()));
        }

        // iw[j] = position of (i, j) in the current row i, or UNSET
        let mut iw = vec![UNSET; n];
        for i in 0..n {
            let row = row_ptr[i]..row_ptr[i + 1];
            for p in row.clone() {
                iw[col_idx[p]] = p;
            }
            for p in row.clone() {
                let k = col_idx[p];
                if k >= i {
                    break;
                }
                let l_ik = vals[p] / vals[diag[k]];
                vals[p] = l_ik;
                for q in (diag[k] + 1)..row_ptr[k + 1] {
                    let w = iw[col_idx[q]];
                    if w != UNSET {
                        vals[w] = vals[w] - l_ik * vals[q];
                    }
                }
            }
            let pivot = vals[diag[i]];
            if !pivot.is_finite() || pivot.abs() <= self.pivot_tolerance * row_scale[i] {
                log::warn!("ILU(0) breakdown: pivot {pivot:?} in row {i}");
                return Err(KError::ZeroPivot(i));
            }
            for p in row {
                iw[col_idx[p]] = UNSET;
            }
        }

        let factors = split_factors(n, row_ptr, col_idx, &vals, &diag);
        log::debug!(
            "ILU(0) of {n}x{n} matrix: nnz(L) = {}, nnz(U) = {}",
            factors.l.nnz(),
            factors.u.nnz()
        );
        self.factors = Some(factors);
        Ok(())
    }

    fn factors(&self) -> Result<&IluFactors<T>, KError> {
        self.factors.as_ref().ok_or(KError::NotInitialized)
    }

    /// Solve L·U z = r.
    pub fn approximate_into(&self, r: &[T], z: &mut [T]) -> Result<(), KError> {
        let IluFactors { l, u } = self.factors()?;
        let n = u.nrows();
        check_apply_dims(n, r.len(), z.len())?;
        // forward substitution: L y = r, y stored in z
        for i in 0..n {
            z[i] = l.row(i).fold(r[i], |acc, (j, l_ij)| acc - l_ij * z[j]);
        }
        // backward substitution: U z = y
        for i in (0..n).rev() {
            let mut entries = u.row(i);
            let (_, u_ii) = entries.next().ok_or(KError::ZeroPivot(i))?;
            let sum = entries.fold(z[i], |acc, (j, u_ij)| acc - u_ij * z[j]);
            z[i] = sum / u_ii;
        }
        Ok(())
    }

    /// Solve (L·U)ᵀ z = r, i.e. Uᵀ y = r followed by Lᵀ z = y.
    pub fn approximate_transpose_into(&self, r: &[T], z: &mut [T]) -> Result<(), KError> {
        let IluFactors { l, u } = self.factors()?;
        let n = u.nrows();
        check_apply_dims(n, r.len(), z.len())?;
        z.copy_from_slice(r);
        // Uᵀ is lower triangular: column sweep over the rows of U
        for i in 0..n {
            let mut entries = u.row(i);
            let (_, u_ii) = entries.next().ok_or(KError::ZeroPivot(i))?;
            let y_i = z[i] / u_ii;
            z[i] = y_i;
            for (j, u_ij) in entries {
                z[j] = z[j] - u_ij * y_i;
            }
        }
        // Lᵀ is unit upper triangular
        for i in (0..n).rev() {
            let z_i = z[i];
            for (j, l_ij) in l.row(i) {
                z[j] = z[j] - l_ij * z_i;
            }
        }
        Ok(())
    }

    /// Allocating variant of [`Ilu0::approximate_into`].
    pub fn approximate(&self, r: &[T]) -> Result<Vec<T>, KError> {
        let mut z = vec![T::zero(); r.len()];
        self.approximate_into(r, &mut z)?;
        Ok(z)
    }

    pub fn approximate_transpose(&self, r: &[T]) -> Result<Vec<T>, KError> {
        let mut z = vec![T::zero(); r.len()];
        self.approximate_transpose_into(r, &mut z)?;
        Ok(z)
    }

    #[cfg(test)]
    pub(crate) fn lower(&self) -> Option<&CsrMatrix<T>> {
        self.factors.as_ref().map(|f| &f.l)
    }

    #[cfg(test)]
    pub(crate) fn upper(&self) -> Option<&CsrMatrix<T>> {
        self.factors.as_ref().map(|f| &f.u)
    }
}

impl<T: Scalar> Default for Ilu0<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Split the eliminated values into the strictly lower and the upper factor.
fn split_factors<T: Scalar>(
    n: usize,
    row_ptr: &[usize],
    col_idx: &[usize],
    vals: &[T],
    diag: &[usize],
) -> IluFactors<T> {
    let mut l_ptr = Vec::with_capacity(n + 1);
    let mut l_idx = Vec::new();
    let mut l_val = Vec::new();
    let mut u_ptr = Vec::with_capacity(n + 1);
    let mut u_idx = Vec::new();
    let mut u_val = Vec::new();
    l_ptr.push(0);
    u_ptr.push(0);
    for i in 0..n {
        l_idx.extend_from_slice(&col_idx[row_ptr[i]..diag[i]]);
        l_val.extend_from_slice(&vals[row_ptr[i]..diag[i]]);
        u_idx.extend_from_slice(&col_idx[diag[i]..row_ptr[i + 1]]);
        u_val.extend_from_slice(&vals[diag[i]..row_ptr[i + 1]]);
        l_ptr.push(l_idx.len());
        u_ptr.push(u_idx.len());
    }
    IluFactors {
        l: CsrMatrix::from_parts_unchecked(n, n, l_ptr, l_idx, l_val),
        u: CsrMatrix::from_parts_unchecked(n, n, u_ptr, u_idx, u_val),
    }
}

impl<T: Scalar> Preconditioner<CsrMatrix<T>, Vec<T>> for Ilu0<T> {
    fn setup(&mut self, a: &CsrMatrix<T>) -> Result<(), KError> {
        self.initialize(a)
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_into(r, z)
    }

    fn apply_transpose(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_transpose_into(r, z)
    }
}

/// Dense input: the pattern is the set of nonzero entries.
impl<T: Scalar> Preconditioner<Mat<T>, Vec<T>> for Ilu0<T> {
    fn setup(&mut self, a: &Mat<T>) -> Result<(), KError> {
        check_square(a.nrows(), a.ncols())?;
        self.initialize(&CsrMatrix::from_dense(a))
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_into(r, z)
    }

    fn apply_transpose(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_transpose_into(r, z)
    }
}
