//! Criterion benchmarks for the annealing search.
//!
//! Uses synthetic banded-covariance instances to compare full energy
//! recomputation against incremental swap deltas as N grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_qubo::sa::{AnnealConfig, AnnealRunner, EnergyEvaluation};
use u_qubo::ProblemInstance;

// ===========================================================================
// Synthetic instance: banded covariance, deterministic returns
// ===========================================================================

fn banded_instance(n: usize) -> ProblemInstance {
    let mu: Vec<f64> = (0..n).map(|i| 0.001 * ((i * 37) % 101) as f64).collect();
    let sigma: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| match i.abs_diff(j) {
                    0 => 0.04,
                    1 => 0.01,
                    2 => 0.005,
                    _ => 0.0,
                })
                .collect()
        })
        .collect();
    ProblemInstance::unnamed(n / 4, 0.5, 10.0, mu, sigma).expect("valid benchmark instance")
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_anneal(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal");
    group.sample_size(10);

    for &n in &[20usize, 100, 400] {
        let instance = banded_instance(n);
        for (label, evaluation) in [
            ("full", EnergyEvaluation::Full),
            ("incremental", EnergyEvaluation::Incremental),
        ] {
            let config = AnnealConfig::default()
                .with_iterations(5_000)
                .with_evaluation(evaluation);
            group.bench_with_input(
                BenchmarkId::new(label, n),
                &(&instance, config),
                |b, (inst, cfg)| {
                    b.iter(|| {
                        let result = AnnealRunner::run(black_box(inst), black_box(cfg));
                        black_box(result)
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_energy(c: &mut Criterion) {
    let mut group = c.benchmark_group("energy");

    for &n in &[20usize, 100, 400] {
        let instance = banded_instance(n);
        let x = u_qubo::Selection::from_indices(n, &(0..n / 4).collect::<Vec<_>>());
        group.bench_with_input(BenchmarkId::from_parameter(n), &(instance, x), |b, (inst, x)| {
            b.iter(|| black_box(inst.energy(black_box(x))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_anneal, bench_energy);
criterion_main!(benches);
