// CSR container used by the ILU preconditioner and the solver.

use crate::core::traits::{MatShape, MatTransVec, MatVec};
use crate::error::KError;
use faer::Mat;
use num_traits::Float;

/// Compressed sparse row matrix.
///
/// Columns are sorted and unique within each row. Every stored entry belongs to
/// the sparsity pattern, including entries whose value is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T> CsrMatrix<T> {
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Assemble from arrays already known to satisfy the CSR invariants.
    pub(crate) fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), nrows + 1);
        debug_assert_eq!(col_idx.len(), values.len());
        Self { nrows, ncols, row_ptr, col_idx, values }
    }
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR from raw row‐ptr, col‐idx, and values.
    ///
    /// The arrays are validated: `row_ptr` must have `nrows + 1` nondecreasing
    /// entries ending at `col_idx.len()`, and column indices must be in range and
    /// strictly increasing within each row.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, KError> {
        if row_ptr.len() != nrows + 1 {
            return Err(KError::InvalidStructure(format!(
                "row_ptr has length {}, expected {}",
                row_ptr.len(),
                nrows + 1
            )));
        }
        if col_idx.len() != values.len() {
            return Err(KError::InvalidStructure(format!(
                "{} column indices but {} values",
                col_idx.len(),
                values.len()
            )));
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_idx.len() {
            return Err(KError::InvalidStructure(
                "row_ptr must start at 0 and end at nnz".to_string(),
            ));
        }
        // with the end pinned at nnz, monotonicity keeps every row range in bounds
        if let Some(i) = row_ptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(KError::InvalidStructure(format!("row_ptr decreases at row {i}")));
        }
        for i in 0..nrows {
            let cols = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            if cols.iter().any(|&j| j >= ncols) {
                return Err(KError::InvalidStructure(format!("column index out of range in row {i}")));
            }
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(KError::InvalidStructure(format!(
                    "columns of row {i} are not strictly increasing"
                )));
            }
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx, values })
    }

    /// Build a CSR from `(row, col, value)` triplets.
    ///
    /// Duplicate positions are summed. A triplet with value zero still adds its
    /// position to the pattern.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, T)],
    ) -> Result<Self, KError> {
        let mut rows: Vec<Vec<(usize, T)>> = vec![Vec::new(); nrows];
        for &(i, j, v) in triplets {
            if i >= nrows || j >= ncols {
                return Err(KError::InvalidStructure(format!(
                    "entry ({i}, {j}) outside a {nrows}x{ncols} matrix"
                )));
            }
            rows[i].push((j, v));
        }
        let mut row_ptr = Vec::with_capacity(nrows + 1);
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        row_ptr.push(0);
        for mut row in rows {
            row.sort_by_key(|&(j, _)| j);
            for (j, v) in row {
                if col_idx.len() > *row_ptr.last().unwrap_or(&0) && col_idx.last() == Some(&j) {
                    if let Some(last) = values.last_mut() {
                        *last = *last + v;
                    }
                } else {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx, values })
    }

    /// Build a CSR holding the nonzero entries of a dense matrix.
    pub fn from_dense(a: &Mat<T>) -> Self {
        let (nrows, ncols) = (a.nrows(), a.ncols());
        let mut row_ptr = vec![0; nrows + 1];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for i in 0..nrows {
            for j in 0..ncols {
                let v = a[(i, j)];
                if v != T::zero() {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr[i + 1] = col_idx.len();
        }
        Self { nrows, ncols, row_ptr, col_idx, values }
    }

    /// Expand into a dense faer matrix.
    pub fn to_dense(&self) -> Mat<T> {
        let mut dense = Mat::from_fn(self.nrows, self.ncols, |_, _| T::zero());
        for i in 0..self.nrows {
            for (j, v) in self.row(i) {
                dense[(i, j)] = v;
            }
        }
        dense
    }

    /// Value at `(i, j)`, zero when the position is not stored.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.position(i, j).map_or(T::zero(), |idx| self.values[idx])
    }

    /// True when `(i, j)` is part of the stored pattern.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.position(i, j).is_some()
    }

    /// Index into the value array for a stored `(i, j)`.
    pub(crate) fn position(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.nrows {
            return None;
        }
        let start = self.row_ptr[i];
        self.col_idx[start..self.row_ptr[i + 1]]
            .binary_search(&j)
            .ok()
            .map(|offset| start + offset)
    }

    /// Stored `(col, value)` pairs of row `i`, in increasing column order.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()].iter().copied().zip(self.values[range].iter().copied())
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Compute y = A x.  `x.len() == ncols()`, `y.len() == nrows()`.
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row(i).fold(T::zero(), |acc, (j, v)| acc + v * x[j]);
        }
    }

    /// Compute y = Aᵀ x.
    pub fn spmv_transpose(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.nrows);
        assert_eq!(y.len(), self.ncols);
        y.iter_mut().for_each(|yi| *yi = T::zero());
        for i in 0..self.nrows {
            for (j, v) in self.row(i) {
                y[j] = y[j] + v * x[i];
            }
        }
    }
}

impl<T> MatShape for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

impl<T: Float> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv(x, y);
    }
}

impl<T: Float> MatTransVec<Vec<T>> for CsrMatrix<T> {
    fn mattransvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv_transpose(x, y);
    }
}
