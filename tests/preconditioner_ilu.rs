//! ILU(0) through the public API: factor quality, preconditioned BiCGStab and
//! configuration-built preconditioners.

use approx::assert_relative_eq;
use faer::Mat;
use kryst_control::config::{PcType, SolverOptions};
use kryst_control::core::traits::MatVec;
use kryst_control::criteria::CalculationStatus;
use kryst_control::error::KError;
use kryst_control::matrix::CsrMatrix;
use kryst_control::preconditioner::{Ilu0, Preconditioner};
use kryst_control::solver::{BiCgStabSolver, LinearSolver};
use kryst_control::utils::precision::slices_almost_equal;
use rand::Rng;

/// Tridiagonal, non-symmetric, diagonally dominant. ILU(0) is exact on it.
fn tridiagonal(n: usize) -> CsrMatrix<f64> {
    let mut t = Vec::new();
    for i in 0..n {
        t.push((i, i, 4.0));
        if i > 0 {
            t.push((i, i - 1, -1.5));
        }
        if i + 1 < n {
            t.push((i, i + 1, -0.5));
        }
    }
    CsrMatrix::from_triplets(n, n, &t).unwrap()
}

/// 5-point convection-diffusion stencil on an m×m grid.
fn convection_diffusion(m: usize) -> CsrMatrix<f64> {
    let n = m * m;
    let mut t = Vec::new();
    for row in 0..m {
        for col in 0..m {
            let i = row * m + col;
            t.push((i, i, 4.0));
            if col > 0 {
                t.push((i, i - 1, -1.3));
            }
            if col + 1 < m {
                t.push((i, i + 1, -0.7));
            }
            if row > 0 {
                t.push((i, i - m, -1.0));
            }
            if row + 1 < m {
                t.push((i, i + m, -1.0));
            }
        }
    }
    CsrMatrix::from_triplets(n, n, &t).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn residual(a: &CsrMatrix<f64>, x: &[f64], b: &[f64]) -> f64 {
    let mut ax = vec![0.0; b.len()];
    a.matvec(&x.to_vec(), &mut ax);
    ax.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum::<f64>().sqrt()
}

#[test]
fn approximate_inverts_full_pattern_matrix() {
    let dense = Mat::from_fn(3, 3, |i, j| [[-1.0, 5.0, 6.0], [3.0, -6.0, 1.0], [6.0, 8.0, 9.0]][i][j]);
    let a = CsrMatrix::from_dense(&dense);
    let mut ilu = Ilu0::new();
    ilu.initialize(&a).unwrap();

    let b = vec![1.0, 2.0, 3.0];
    let z = ilu.approximate(&b).unwrap();
    let mut az = vec![0.0; 3];
    a.matvec(&z, &mut az);
    assert!(slices_almost_equal(&az, &b, 1e-12), "A * M^-1 b = {az:?}");
}

#[test]
fn approximate_is_exact_without_fill_in() {
    let mut rng = rand::thread_rng();
    let a = tridiagonal(40);
    let mut ilu = Ilu0::new();
    ilu.initialize(&a).unwrap();
    for _ in 0..10 {
        let b: Vec<f64> = (0..40).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let z = ilu.approximate(&b).unwrap();
        assert!(residual(&a, &z, &b) < 1e-12);

        let zt = ilu.approximate_transpose(&b).unwrap();
        let mut atz = vec![0.0; 40];
        a.spmv_transpose(&zt, &mut atz);
        assert!(slices_almost_equal(&atz, &b, 1e-10));
    }
}

#[test]
fn preconditioned_bicgstab_converges_faster() {
    init_logging();
    let a = convection_diffusion(12);
    let n = a.nrows();
    let b = vec![1.0; n];

    let mut plain = BiCgStabSolver::new(1e-10, 500).unwrap();
    let mut x_plain = vec![0.0; n];
    let plain_stats = plain.solve(&a, None, &b, &mut x_plain).unwrap();
    assert!(plain_stats.converged);

    let mut ilu = Ilu0::new();
    ilu.setup(&a).unwrap();
    let mut pre = BiCgStabSolver::new(1e-10, 500).unwrap();
    let mut x_pre = vec![0.0; n];
    let pre_stats = pre.solve(&a, Some(&ilu), &b, &mut x_pre).unwrap();
    assert!(pre_stats.converged);
    assert!(
        pre_stats.iterations < plain_stats.iterations,
        "ILU(0): {} iterations, none: {}",
        pre_stats.iterations,
        plain_stats.iterations
    );
    assert!(residual(&a, &x_pre, &b) < 1e-8);
    for (p, q) in x_pre.iter().zip(&x_plain) {
        assert_relative_eq!(*p, *q, max_relative = 1e-6);
    }
}

#[test]
fn options_drive_the_whole_solve() {
    init_logging();
    let a = tridiagonal(25);
    let b: Vec<f64> = (0..25).map(|i| i as f64).collect();
    for pc_type in [PcType::None, PcType::Jacobi, PcType::Ilu0] {
        let opts = SolverOptions::default().with_pc(pc_type).with_residual_tol(1e-12);
        let mut pc = opts.build_preconditioner::<f64>().unwrap();
        pc.setup(&a).unwrap();
        let mut solver = BiCgStabSolver::with_criteria(opts.build_criteria::<f64>().unwrap());
        let mut x = vec![0.0; 25];
        let stats = solver.solve(&a, Some(pc.as_ref()), &b, &mut x).unwrap();
        assert_eq!(stats.status, CalculationStatus::Converged, "{pc_type:?}");
        assert!(residual(&a, &x, &b) < 1e-9, "{pc_type:?}");
    }
}

#[test]
fn singular_leading_block_is_reported() {
    let a = CsrMatrix::from_triplets(
        3,
        3,
        &[(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 4.0), (2, 2, 1.0)],
    )
    .unwrap();
    let mut ilu = Ilu0::new();
    assert_eq!(ilu.initialize(&a), Err(KError::ZeroPivot(1)));
    assert!(!ilu.is_initialized());
}

#[test]
fn reinitialization_replaces_factors() {
    let mut ilu = Ilu0::new();
    ilu.initialize(&tridiagonal(5)).unwrap();
    assert_eq!(ilu.dim(), Some(5));
    let a = tridiagonal(8);
    ilu.initialize(&a).unwrap();
    assert_eq!(ilu.dim(), Some(8));
    let b = vec![1.0; 8];
    let z = ilu.approximate(&b).unwrap();
    assert!(residual(&a, &z, &b) < 1e-12);
    assert!(matches!(ilu.approximate(&[1.0; 5]), Err(KError::DimensionMismatch { .. })));
}
