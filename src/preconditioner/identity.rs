// Identity preconditioner: M⁻¹ = I

use crate::core::traits::{MatShape, Scalar};
use crate::error::KError;
use crate::preconditioner::{check_apply_dims, check_square, Preconditioner};

/// Leaves vectors untouched; useful as the "no preconditioning" choice.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    n: Option<usize>,
}

impl Identity {
    pub fn new() -> Self {
        Self { n: None }
    }
}

impl<M, T> Preconditioner<M, Vec<T>> for Identity
where
    M: MatShape,
    T: Scalar,
{
    fn setup(&mut self, a: &M) -> Result<(), KError> {
        check_square(a.nrows(), a.ncols())?;
        self.n = Some(a.nrows());
        Ok(())
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        let n = self.n.ok_or(KError::NotInitialized)?;
        check_apply_dims(n, r.len(), z.len())?;
        z.copy_from_slice(r);
        Ok(())
    }

    fn apply_transpose(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        Preconditioner::<M, Vec<T>>::apply(self, r, z)
    }
}
