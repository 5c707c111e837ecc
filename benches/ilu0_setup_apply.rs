use criterion::{black_box, Criterion, criterion_group, criterion_main};
use kryst_control::matrix::CsrMatrix;
use kryst_control::preconditioner::Ilu0;
use kryst_control::solver::{BiCgStabSolver, LinearSolver};

fn laplacian_2d(m: usize) -> CsrMatrix<f64> {
    let n = m * m;
    let mut t = Vec::with_capacity(5 * n);
    for row in 0..m {
        for col in 0..m {
            let i = row * m + col;
            t.push((i, i, 4.0));
            if col > 0 {
                t.push((i, i - 1, -1.0));
            }
            if col + 1 < m {
                t.push((i, i + 1, -1.0));
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

fn bench_ilu0(c: &mut Criterion) {
    let a = laplacian_2d(100);
    let n = a.nrows();
    let b: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();

    c.bench_function("ilu0 setup 100x100 grid", |ben| {
        ben.iter(|| {
            let mut ilu = Ilu0::new();
            ilu.initialize(black_box(&a)).unwrap();
        })
    });

    let mut ilu = Ilu0::new();
    ilu.initialize(&a).unwrap();
    let mut z = vec![0.0; n];
    c.bench_function("ilu0 apply 100x100 grid", |ben| {
        ben.iter(|| ilu.approximate_into(black_box(&b), black_box(&mut z)).unwrap())
    });

    c.bench_function("bicgstab + ilu0 100x100 grid", |ben| {
        let mut solver = BiCgStabSolver::new(1e-8, 1000).unwrap();
        ben.iter(|| {
            let mut x = vec![0.0; n];
            let _stats = solver.solve(black_box(&a), Some(&ilu), black_box(&b), &mut x).unwrap();
        })
    });
}

criterion_group!(benches, bench_ilu0);
criterion_main!(benches);
