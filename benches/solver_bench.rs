//! Benchmarks for the matrix game solver.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use brown_robinson::games::{BilinearKernel, Preset};
use brown_robinson::solver::{
    BrownRobinson, Equality, ExtremumFinder, GameSolver, SaddleConfig, SolverConfig,
};

fn extremum_scan_benchmark(c: &mut Criterion) {
    let values: Vec<f64> = (0..1024).map(|i| ((i * 37) % 101) as f64).collect();
    let finder = ExtremumFinder::max(Equality::Exact);
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("extremum_random_1024", |b| {
        b.iter(|| finder.random(black_box(values.iter().copied()), &mut rng))
    });
}

fn reference_solve_benchmark(c: &mut Criterion) {
    let matrix = Preset::Reference.matrix::<f64>().unwrap();

    c.bench_function("reference_3x3_eps_0.01", |b| {
        b.iter(|| {
            let mut solver = BrownRobinson::new(SolverConfig::default().with_eps(0.01).with_seed(42))
                .unwrap();
            solver.solve(black_box(&matrix))
        })
    });
}

fn discretization_level_benchmark(c: &mut Criterion) {
    let kernel = BilinearKernel::<f64>::reference().unwrap();
    let matrix = kernel.discretize(10).unwrap();

    c.bench_function("kernel_level_n10", |b| {
        b.iter(|| {
            let mut solver =
                GameSolver::from_parts(SaddleConfig::default(), SolverConfig::precise().with_seed(42))
                    .unwrap();
            solver.solve_matrix(black_box(&matrix))
        })
    });
}

criterion_group!(
    benches,
    extremum_scan_benchmark,
    reference_solve_benchmark,
    discretization_level_benchmark
);
criterion_main!(benches);
