//! Options for stop criteria and preconditioners.
//!
//! This module provides the `SolverOptions` struct, which collects the
//! parameters of the default criteria set (failure detection, residual
//! tolerance, iteration budget and, optionally, divergence and delta tests)
//! and the choice of preconditioner. The available preconditioners are
//! identity, Jacobi and ILU(0).

use crate::core::traits::Scalar;
use crate::criteria::{
    CompositeCriterion, DeltaCriterion, DivergenceCriterion, FailureCriterion,
    IterationCountCriterion, ResidualCriterion, ResidualNorm,
};
use crate::error::KError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::{Identity, Ilu0, Jacobi, Preconditioner};

/// Preconditioner types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PcType {
    /// No preconditioning (identity).
    None,
    /// Diagonal scaling.
    Jacobi,
    /// Incomplete LU with zero fill-in.
    #[default]
    Ilu0,
}

/// Divergence test parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceOptions {
    pub maximum_relative_increase: f64,
    pub minimum_iterations: usize,
}

impl Default for DivergenceOptions {
    fn default() -> Self {
        Self { maximum_relative_increase: 0.08, minimum_iterations: 10 }
    }
}

/// Stop criteria & preconditioner parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Type of preconditioner (none, jacobi, ilu0)
    pub pc_type: PcType,
    /// Relative pivot tolerance for ILU(0); `None` keeps machine epsilon
    pub pivot_tolerance: Option<f64>,
    /// Residual tolerance
    pub residual_tol: f64,
    /// Relative or absolute residual test
    pub residual_norm: ResidualNorm,
    /// Consecutive iterations the residual must stay below tolerance, minus one
    pub minimum_iterations_below: usize,
    /// Iteration budget
    pub max_iters: usize,
    /// Enables the divergence test
    pub divergence: Option<DivergenceOptions>,
    /// Enables the element-delta test with this tolerance
    pub delta_tol: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            pc_type: PcType::default(),
            pivot_tolerance: None,
            residual_tol: 1e-8,
            residual_norm: ResidualNorm::Relative,
            minimum_iterations_below: 0,
            max_iters: 1000,
            divergence: None,
            delta_tol: None,
        }
    }
}

fn cast<T: Scalar>(name: &str, v: f64) -> Result<T, KError> {
    T::from(v).ok_or_else(|| KError::InvalidParameter(format!("{name} = {v} is not representable")))
}

impl SolverOptions {
    pub fn with_pc(mut self, pc_type: PcType) -> Self {
        self.pc_type = pc_type;
        self
    }

    pub fn with_residual_tol(mut self, tol: f64) -> Self {
        self.residual_tol = tol;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_divergence(mut self, divergence: DivergenceOptions) -> Self {
        self.divergence = Some(divergence);
        self
    }

    pub fn with_delta_tol(mut self, tol: f64) -> Self {
        self.delta_tol = Some(tol);
        self
    }

    /// Criteria in evaluation order: failure, residual, iteration budget,
    /// then the optional divergence and delta tests.
    pub fn build_criteria<T: Scalar>(&self) -> Result<CompositeCriterion<T>, KError> {
        let residual = ResidualCriterion::new(cast("residual_tol", self.residual_tol)?)?
            .with_norm(self.residual_norm)
            .with_minimum_iterations_below(self.minimum_iterations_below);
        let mut criteria = CompositeCriterion::new()
            .with(FailureCriterion::new())
            .with(residual)
            .with(IterationCountCriterion::new(self.max_iters));
        if let Some(d) = self.divergence {
            criteria = criteria.with(DivergenceCriterion::new(
                cast("maximum_relative_increase", d.maximum_relative_increase)?,
                d.minimum_iterations,
            )?);
        }
        if let Some(tol) = self.delta_tol {
            criteria = criteria.with(DeltaCriterion::new(cast("delta_tol", tol)?)?);
        }
        Ok(criteria)
    }

    /// Unconfigured preconditioner of the selected type; call `setup` next.
    pub fn build_preconditioner<T: Scalar>(
        &self,
    ) -> Result<Box<dyn Preconditioner<CsrMatrix<T>, Vec<T>>>, KError> {
        Ok(match self.pc_type {
            PcType::None => Box::new(Identity::new()),
            PcType::Jacobi => Box::new(Jacobi::<T>::new()),
            PcType::Ilu0 => {
                let mut ilu = Ilu0::<T>::new();
                if let Some(tol) = self.pivot_tolerance {
                    ilu = ilu.with_pivot_tolerance(cast("pivot_tolerance", tol)?)?;
                }
                Box::new(ilu)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CriterionKind, StopCriterion};

    #[test]
    fn default_criteria_order() {
        let criteria = SolverOptions::default().build_criteria::<f64>().unwrap();
        let kinds: Vec<_> = criteria.criteria().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![CriterionKind::Failure, CriterionKind::Residual, CriterionKind::IterationCount]
        );
    }

    #[test]
    fn optional_criteria_are_appended() {
        let opts = SolverOptions::default()
            .with_divergence(DivergenceOptions::default())
            .with_delta_tol(1e-12);
        let criteria = opts.build_criteria::<f32>().unwrap();
        let kinds: Vec<_> = criteria.criteria().map(|c| c.kind()).collect();
        assert_eq!(kinds[3..], [CriterionKind::Divergence, CriterionKind::Delta]);
    }

    #[test]
    fn invalid_tolerance_is_reported() {
        let opts = SolverOptions::default().with_residual_tol(-1.0);
        assert!(matches!(opts.build_criteria::<f64>(), Err(KError::InvalidParameter(_))));
    }

    #[test]
    fn invalid_pivot_tolerance_is_reported() {
        for tol in [f64::NAN, -1.0] {
            let opts = SolverOptions { pivot_tolerance: Some(tol), ..SolverOptions::default() };
            assert!(matches!(
                opts.build_preconditioner::<f64>(),
                Err(KError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn builds_requested_preconditioner() {
        let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0)]).unwrap();
        for pc_type in [PcType::None, PcType::Jacobi, PcType::Ilu0] {
            let mut pc = SolverOptions::default().with_pc(pc_type).build_preconditioner::<f64>().unwrap();
            pc.setup(&a).unwrap();
            let mut z = vec![0.0; 2];
            pc.apply(&vec![2.0, 4.0], &mut z).unwrap();
            let expected = if pc_type == PcType::None { vec![2.0, 4.0] } else { vec![1.0, 1.0] };
            assert_eq!(z, expected);
        }
    }
}
