// Jacobi preconditioner implementation

use crate::core::traits::Scalar;
use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::{check_apply_dims, check_square, Preconditioner};
use faer::Mat;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
#[derive(Debug, Clone)]
pub struct Jacobi<T> {
    pub(crate) inv_diag: Option<Vec<T>>,
}

impl<T: Scalar> Jacobi<T> {
    /// new with empty state; user must call `setup`.
    pub fn new() -> Self {
        Self { inv_diag: None }
    }

    fn set_diagonal(&mut self, diag: impl Iterator<Item = T>) -> Result<(), KError> {
        let inv_diag = diag
            .enumerate()
            .map(|(i, d)| {
                if d == T::zero() || !d.is_finite() {
                    Err(KError::ZeroPivot(i))
                } else {
                    Ok(T::one() / d)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.inv_diag = Some(inv_diag);
        Ok(())
    }

    /// z = D⁻¹ r
    pub fn approximate_into(&self, r: &[T], z: &mut [T]) -> Result<(), KError> {
        let inv_diag = self.inv_diag.as_ref().ok_or(KError::NotInitialized)?;
        check_apply_dims(inv_diag.len(), r.len(), z.len())?;
        for ((zi, &ri), &di) in z.iter_mut().zip(r).zip(inv_diag) {
            *zi = di * ri;
        }
        Ok(())
    }

    pub fn approximate(&self, r: &[T]) -> Result<Vec<T>, KError> {
        let mut z = vec![T::zero(); r.len()];
        self.approximate_into(r, &mut z)?;
        Ok(z)
    }
}

impl<T: Scalar> Default for Jacobi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Preconditioner<CsrMatrix<T>, Vec<T>> for Jacobi<T> {
    fn setup(&mut self, a: &CsrMatrix<T>) -> Result<(), KError> {
        check_square(a.nrows(), a.ncols())?;
        self.set_diagonal((0..a.nrows()).map(|i| a.get(i, i)))
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_into(r, z)
    }

    fn apply_transpose(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_into(r, z)
    }
}

impl<T: Scalar> Preconditioner<Mat<T>, Vec<T>> for Jacobi<T> {
    fn setup(&mut self, a: &Mat<T>) -> Result<(), KError> {
        check_square(a.nrows(), a.ncols())?;
        self.set_diagonal((0..a.nrows()).map(|i| a[(i, i)]))
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_into(r, z)
    }

    fn apply_transpose(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        self.approximate_into(r, z)
    }
}
