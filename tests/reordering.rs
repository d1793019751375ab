use cal_bdd::bdd::Bdd;
use cal_bdd::config::{BddConfig, ReorderTechnique};
use cal_bdd::types::{Level, Var};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

mod common;
use common::{random_function, truth_table, vars};

fn check_reorder_preserves_functions(technique: ReorderTechnique, seed: u64) {
    let bdd = Bdd::default();
    let x = vars(&bdd, 7);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let functions: Vec<_> = (0..4).map(|_| random_function(&x, 14, &mut rng)).collect();
    let tables: Vec<_> = functions.iter().map(|f| truth_table(f, 7)).collect();
    let supports: Vec<_> = functions.iter().map(|f| f.support()).collect();

    let stats = bdd.reorder_with(technique).unwrap();
    bdd.check_invariants();
    assert!(stats.final_size <= stats.initial_size);

    for ((f, table), support) in functions.iter().zip(&tables).zip(&supports) {
        assert_eq!(&truth_table(f, 7), table);
        let mut new_support = f.support();
        let mut old_support = support.clone();
        new_support.sort();
        old_support.sort();
        assert_eq!(new_support, old_support);
    }

    // Operations after reordering still produce canonical results.
    let g = functions[0].and(&functions[1]).unwrap();
    let h = functions[1].and(&functions[0]).unwrap();
    assert_eq!(g, h);
    let expected: Vec<bool> = tables[0].iter().zip(&tables[1]).map(|(a, b)| *a && *b).collect();
    assert_eq!(truth_table(&g, 7), expected);
}

#[test]
fn test_sift_preserves_random_functions() {
    for seed in [1, 2, 3, 4, 5] {
        check_reorder_preserves_functions(ReorderTechnique::Sift, seed);
    }
}

#[test]
fn test_window_preserves_random_functions() {
    for seed in [6, 7, 8] {
        check_reorder_preserves_functions(ReorderTechnique::Window, seed);
    }
}

#[test]
fn test_random_swaps_preserve_functions() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 6);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let f = random_function(&x, 12, &mut rng);
    let g = random_function(&x, 12, &mut rng);
    let (tf, tg) = (truth_table(&f, 6), truth_table(&g, 6));
    let (ef, eg) = (f.edge(), g.edge());

    for _ in 0..40 {
        let level = Level::new(rng.random_range(0..5));
        bdd.swap_adjacent(level).unwrap();
    }
    bdd.check_invariants();
    assert_eq!(f.edge(), ef);
    assert_eq!(g.edge(), eg);
    assert_eq!(truth_table(&f, 6), tf);
    assert_eq!(truth_table(&g, 6), tg);

    let mut order = bdd.var_order();
    order.sort();
    assert_eq!(order, (1..=6).map(Var::new).collect::<Vec<_>>());
}

#[test]
fn test_sift_then_window_on_bad_order() {
    // (x1 ∧ y1) ∨ (x2 ∧ y2) ∨ (x3 ∧ y3) ∨ (x4 ∧ y4) with all x above all y.
    let bdd = Bdd::default();
    let xs = vars(&bdd, 4);
    let ys = vars(&bdd, 4);
    let mut f = bdd.zero();
    for (x, y) in xs.iter().zip(&ys) {
        f = f.or(&x.and(y).unwrap()).unwrap();
    }
    assert_eq!(f.size(), 30);

    let table = truth_table(&f, 8);
    bdd.reorder_with(ReorderTechnique::Sift).unwrap();
    assert!(f.size() < 30, "sifting left {} nodes", f.size());
    let sifted = bdd.node_count();
    assert_eq!(truth_table(&f, 8), table);

    // A window pass never makes things worse.
    bdd.reorder_with(ReorderTechnique::Window).unwrap();
    assert!(bdd.node_count() <= sifted);
    assert_eq!(truth_table(&f, 8), table);
    bdd.check_invariants();
}

#[test]
fn test_dynamic_reordering_keeps_handles_valid() {
    let config = BddConfig::default()
        .with_reorder_threshold(50)
        .with_reorder_technique(ReorderTechnique::Sift)
        .with_dynamic_reordering(true);
    let bdd = Bdd::with_config(config);
    let x = vars(&bdd, 8);
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    let mut kept = Vec::new();
    for _ in 0..6 {
        let f = random_function(&x, 20, &mut rng);
        kept.push((truth_table(&f, 8), f));
    }
    assert!(bdd.stats().reorderings > 0);
    for (table, f) in &kept {
        assert_eq!(&truth_table(f, 8), table);
    }
    bdd.check_invariants();
}

#[test]
fn test_new_variables_after_reordering() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 3);
    let f = x[0].and(&x[2]).unwrap();
    bdd.swap_adjacent(Level::new(0)).unwrap();

    let y = bdd.new_var_after(&x[0]).unwrap();
    assert_eq!(y.index(), Some(x[0].index().unwrap().next()));
    let g = f.and(&y).unwrap();
    assert_eq!(g.sat_count(4), num_bigint::BigUint::from(2u32));
    bdd.check_invariants();
}
