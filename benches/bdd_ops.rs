//! BDD operation benchmarks.
//!
//! Run with:
//! ```bash
//! cargo bench --bench bdd_ops
//! ```

use cal_bdd::bdd::Bdd;
use cal_bdd::config::{BddConfig, ReorderTechnique};
use cal_bdd::function::Function;
use cal_bdd::types::Var;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// Helper: N-Queens Problem (canonical BDD benchmark)
// ============================================================================

/// Solve N-Queens and return the size of the result.
fn solve_queens(bdd: &Bdd, n: usize) -> usize {
    let q: Vec<Vec<Function<'_>>> = (0..n)
        .map(|_| (0..n).map(|_| bdd.new_var_last().unwrap()).collect())
        .collect();

    let mut result = bdd.one();

    for i in 0..n {
        // At least one queen per row
        let row: Vec<&Function<'_>> = q[i].iter().collect();
        result = result.and(&bdd.or_many(&row).unwrap()).unwrap();

        // At most one per row
        for j1 in 0..n {
            for j2 in (j1 + 1)..n {
                result = result.and(&q[i][j1].nand(&q[i][j2]).unwrap()).unwrap();
            }
        }
    }

    // At most one per column and diagonal
    for i1 in 0..n {
        for j1 in 0..n {
            for i2 in (i1 + 1)..n {
                for j2 in 0..n {
                    let d = i2 - i1;
                    if j2 == j1 || j2 + d == j1 || j1 + d == j2 {
                        result = result.and(&q[i1][j1].nand(&q[i2][j2]).unwrap()).unwrap();
                    }
                }
            }
        }
    }

    result.size()
}

/// Fold `num_ops` random connectives over `num_vars` random literals.
fn build_random_formula(bdd: &Bdd, num_vars: usize, num_ops: usize, seed: u64) -> usize {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let vars: Vec<_> = (0..num_vars).map(|_| bdd.new_var_last().unwrap()).collect();

    let mut nodes: Vec<Function<'_>> = vars
        .iter()
        .map(|v| if rng.random_bool(0.5) { v.clone() } else { v.not() })
        .collect();

    for _ in 0..num_ops {
        let i = rng.random_range(0..nodes.len());
        let j = rng.random_range(0..nodes.len());
        let result = match rng.random_range(0..3) {
            0 => nodes[i].and(&nodes[j]),
            1 => nodes[i].or(&nodes[j]),
            _ => nodes[i].xor(&nodes[j]),
        };
        let k = rng.random_range(0..nodes.len());
        nodes[k] = result.unwrap();
    }

    let refs: Vec<&Function<'_>> = nodes.iter().collect();
    bdd.size_of(&refs)
}

// ============================================================================
// Benchmark: Queens scaling, with and without dynamic reordering
// ============================================================================

fn bench_queens(c: &mut Criterion) {
    let mut group = c.benchmark_group("bdd/queens");
    group.sample_size(10);

    for technique in [ReorderTechnique::None, ReorderTechnique::Sift] {
        for n in [4, 5, 6] {
            group.bench_with_input(BenchmarkId::new(format!("{:?}", technique), n), &n, |b, &n| {
                b.iter(|| {
                    let config = BddConfig::default()
                        .with_cache_bits(18)
                        .with_reorder_technique(technique)
                        .with_reorder_threshold(2_000)
                        .with_dynamic_reordering(technique != ReorderTechnique::None);
                    let bdd = Bdd::with_config(config);
                    black_box(solve_queens(&bdd, n))
                });
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Random formulas
// ============================================================================

fn bench_random_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("bdd/random_formula");

    for cache_bits in [12, 16] {
        let config = BddConfig::default().with_cache_bits(cache_bits);
        group.bench_with_input(
            BenchmarkId::new("v=16,ops=300", format!("2^{}", cache_bits)),
            &config,
            |b, config| {
                b.iter(|| {
                    let bdd = Bdd::with_config(config.clone());
                    black_box(build_random_formula(&bdd, 16, 300, 42))
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Explicit reordering of a badly ordered function
// ============================================================================

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("bdd/reorder");
    group.sample_size(10);

    for technique in [ReorderTechnique::Sift, ReorderTechnique::Window] {
        for pairs in [6, 8] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", technique), pairs),
                &pairs,
                |b, &pairs| {
                    b.iter(|| {
                        let bdd = Bdd::default();
                        let xs: Vec<_> = (0..pairs).map(|_| bdd.new_var_last().unwrap()).collect();
                        let ys: Vec<_> = (0..pairs).map(|_| bdd.new_var_last().unwrap()).collect();
                        let mut f = bdd.zero();
                        for (x, y) in xs.iter().zip(&ys) {
                            f = f.or(&x.and(y).unwrap()).unwrap();
                        }
                        bdd.reorder_with(technique).unwrap();
                        black_box(f.size())
                    });
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Quantification
// ============================================================================

fn bench_quantification(c: &mut Criterion) {
    let mut group = c.benchmark_group("bdd/quantification");
    group.sample_size(20);

    for num_vars in [12, 16] {
        group.bench_with_input(BenchmarkId::new("rel_prod", num_vars), &num_vars, |b, &num_vars| {
            b.iter(|| {
                let bdd = Bdd::default();
                let mut rng = ChaCha8Rng::seed_from_u64(7);
                let vars: Vec<_> = (0..num_vars).map(|_| bdd.new_var_last().unwrap()).collect();
                let clause = |rng: &mut ChaCha8Rng| {
                    let a = &vars[rng.random_range(0..num_vars)];
                    let b = &vars[rng.random_range(0..num_vars)];
                    a.or(&b.not()).unwrap()
                };
                let mut f = bdd.one();
                let mut g = bdd.one();
                for _ in 0..num_vars {
                    f = f.and(&clause(&mut rng)).unwrap();
                    g = g.and(&clause(&mut rng)).unwrap();
                }
                let quantified: Vec<Var> = (1..=num_vars as u32).step_by(2).map(Var::new).collect();
                let id = bdd.association_init_vars(&quantified).unwrap();
                bdd.association_set_current(id).unwrap();
                let size = f.rel_prod(&g).unwrap().size();
                black_box(size)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_queens,
    bench_random_formula,
    bench_reorder,
    bench_quantification,
);

criterion_main!(benches);
