//! Right-preconditioned BiCGStab (Saad §7.4.2), controlled by stop criteria.
//!
//! The loop itself never decides when to stop: after every iteration the
//! current solution, right-hand side and residual are handed to a
//! [`CompositeCriterion`], and the loop ends as soon as it reports a terminal
//! status. The criteria are reset at the start of each solve.

use crate::core::traits::{InnerProduct, MatShape, MatVec, Scalar};
use crate::criteria::{CalculationStatus, CompositeCriterion, StopCriterion};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::SolveStats;

pub struct BiCgStabSolver<T> {
    pub criteria: CompositeCriterion<T>,
}

impl<T: Scalar> BiCgStabSolver<T> {
    /// Failure detection, relative residual `tol` and an iteration budget.
    pub fn new(tol: T, max_iters: usize) -> Result<Self, KError> {
        Ok(Self { criteria: CompositeCriterion::with_defaults(tol, max_iters)? })
    }

    pub fn with_criteria(criteria: CompositeCriterion<T>) -> Self {
        Self { criteria }
    }
}

/// z = M⁻¹ r, or a copy of r without preconditioner.
fn precondition<M, T: Scalar>(
    pc: Option<&dyn Preconditioner<M, Vec<T>>>,
    r: &Vec<T>,
    z: &mut Vec<T>,
) -> Result<(), KError> {
    match pc {
        Some(pc) => pc.apply(r, z),
        None => {
            z.copy_from_slice(r);
            Ok(())
        }
    }
}

impl<M, T> LinearSolver<M, Vec<T>> for BiCgStabSolver<T>
where
    M: MatVec<Vec<T>> + MatShape,
    T: Scalar,
{
    type Error = KError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, Vec<T>>>,
        b: &Vec<T>,
        x: &mut Vec<T>,
    ) -> Result<SolveStats<T>, KError> {
        if !a.is_square() {
            return Err(KError::NotSquare { nrows: a.nrows(), ncols: a.ncols() });
        }
        let n = a.nrows();
        for len in [b.len(), x.len()] {
            if len != n {
                return Err(KError::DimensionMismatch { expected: n, found: len });
            }
        }
        let ip = ();
        self.criteria.reset();

        // r0 = b - A x0
        let mut r = vec![T::zero(); n];
        a.matvec(x, &mut r);
        for (rj, &bj) in r.iter_mut().zip(b.iter()) {
            *rj = bj - *rj;
        }
        let mut status = self.criteria.determine_status(0, Some(x.as_slice()), Some(b.as_slice()), Some(r.as_slice()))?;
        let mut stats = SolveStats {
            iterations: 0,
            final_residual: ip.norm(r.as_slice()),
            converged: status == CalculationStatus::Converged,
            status,
        };
        if status.is_terminal() {
            return Ok(stats);
        }

        let r_hat = r.clone();
        let mut rho_prev = T::one();
        let mut alpha = T::one();
        let mut omega = T::one();
        let mut v = vec![T::zero(); n];
        let mut p = vec![T::zero(); n];
        let mut p_hat = vec![T::zero(); n];
        let mut s = vec![T::zero(); n];
        let mut s_hat = vec![T::zero(); n];
        let mut t = vec![T::zero(); n];

        let mut k = 0usize;
        while status.is_running() {
            k += 1;
            let rho = ip.dot(r_hat.as_slice(), r.as_slice());
            if rho == T::zero() {
                log::warn!("BiCGStab breakdown (rho = 0) at iteration {k}");
                status = CalculationStatus::Failed;
                break;
            }
            let beta = (rho / rho_prev) * (alpha / omega);
            // p = r + beta * (p - omega * v)
            for ((pj, &rj), &vj) in p.iter_mut().zip(r.iter()).zip(v.iter()) {
                *pj = rj + beta * (*pj - omega * vj);
            }
            precondition(pc, &p, &mut p_hat)?;
            a.matvec(&p_hat, &mut v);
            let r_hat_v = ip.dot(r_hat.as_slice(), v.as_slice());
            if r_hat_v == T::zero() {
                log::warn!("BiCGStab breakdown (r_hat . v = 0) at iteration {k}");
                status = CalculationStatus::Failed;
                break;
            }
            alpha = rho / r_hat_v;
            // s = r - alpha * v
            for ((sj, &rj), &vj) in s.iter_mut().zip(r.iter()).zip(v.iter()) {
                *sj = rj - alpha * vj;
            }
            precondition(pc, &s, &mut s_hat)?;
            a.matvec(&s_hat, &mut t);
            let tt = ip.dot(t.as_slice(), t.as_slice());
            omega = if tt == T::zero() {
                T::zero()
            } else {
                ip.dot(t.as_slice(), s.as_slice()) / tt
            };
            // x = x + alpha * p_hat + omega * s_hat, r = s - omega * t
            for j in 0..n {
                x[j] = x[j] + alpha * p_hat[j] + omega * s_hat[j];
                r[j] = s[j] - omega * t[j];
            }
            status = self.criteria.determine_status(
                k as isize,
                Some(x.as_slice()),
                Some(b.as_slice()),
                Some(r.as_slice()),
            )?;
            log::trace!("BiCGStab iteration {k}: {status}");
            if status.is_running() && omega == T::zero() {
                log::warn!("BiCGStab breakdown (omega = 0) at iteration {k}");
                status = CalculationStatus::Failed;
            }
            rho_prev = rho;
        }

        stats.iterations = k;
        stats.final_residual = ip.norm(r.as_slice());
        stats.converged = status == CalculationStatus::Converged;
        stats.status = status;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{FailureCriterion, IterationCountCriterion};
    use crate::preconditioner::Ilu0;
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    // Helper: well-conditioned non-symmetric 3x3 matrix
    fn nonsym_3x3() -> (Mat<f64>, Vec<f64>) {
        let a = Mat::from_fn(3, 3, |i, j| if i == j { 4.0 } else { (i + 2 * j) as f64 + 1.0 });
        let x_true = vec![1.0, 2.0, 3.0];
        let mut b = vec![0.0; 3];
        a.matvec(&x_true, &mut b);
        (a, b)
    }

    #[test]
    fn bicgstab_solves_well_conditioned_nonsym() {
        let (a, b) = nonsym_3x3();
        let mut x = vec![0.0; 3];
        let mut solver = BiCgStabSolver::new(1e-10, 100).unwrap();
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        let x_true = vec![1.0, 2.0, 3.0];
        for i in 0..3 {
            assert_abs_diff_eq!(x[i], x_true[i], epsilon = 1e-8);
        }
        assert!(stats.converged, "BiCGStab did not converge: stats = {:?}", stats);
    }

    #[test]
    fn exact_ilu_converges_in_one_iteration() {
        // full pattern, so ILU(0) is the exact LU factorization
        let (a, b) = nonsym_3x3();
        let mut pc = Ilu0::new();
        pc.setup(&a).unwrap();
        let mut x = vec![0.0; 3];
        let mut solver = BiCgStabSolver::new(1e-10, 50).unwrap();
        let stats = solver.solve(&a, Some(&pc), &b, &mut x).unwrap();
        assert!(stats.converged);
        assert_eq!(stats.iterations, 1);
    }

    #[test]
    fn iteration_budget_stops_the_loop() {
        let (a, b) = nonsym_3x3();
        let mut x = vec![0.0; 3];
        let criteria = CompositeCriterion::new()
            .with(FailureCriterion::new())
            .with(IterationCountCriterion::new(1));
        let mut solver = BiCgStabSolver::with_criteria(criteria);
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        assert_eq!(stats.status, CalculationStatus::StoppedWithoutConvergence);
        assert_eq!(stats.iterations, 1);
        assert!(!stats.converged);
    }

    #[test]
    fn zero_rhs_converges_immediately() {
        let (a, _) = nonsym_3x3();
        let b = vec![0.0; 3];
        let mut x = vec![0.0; 3];
        let mut solver = BiCgStabSolver::new(1e-10, 50).unwrap();
        let stats = solver.solve(&a, None, &b, &mut x).unwrap();
        assert!(stats.converged);
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn rejects_wrong_rhs_length() {
        let (a, _) = nonsym_3x3();
        let mut x = vec![0.0; 3];
        let mut solver = BiCgStabSolver::new(1e-10, 50).unwrap();
        let err = solver.solve(&a, None, &vec![1.0; 2], &mut x).unwrap_err();
        assert_eq!(err, KError::DimensionMismatch { expected: 3, found: 2 });
    }
}
