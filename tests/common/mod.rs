#![allow(dead_code)]

use cal_bdd::bdd::Bdd;
use cal_bdd::function::Function;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub fn vars(bdd: &Bdd, n: usize) -> Vec<Function<'_>> {
    (0..n).map(|_| bdd.new_var_last().unwrap()).collect()
}

/// A random function over `vars`, built from `num_ops` random connectives.
pub fn random_function<'a>(vars: &[Function<'a>], num_ops: usize, rng: &mut ChaCha8Rng) -> Function<'a> {
    let mut nodes: Vec<Function<'a>> = vars
        .iter()
        .map(|v| if rng.random_bool(0.5) { v.clone() } else { v.not() })
        .collect();

    for _ in 0..num_ops {
        let i = rng.random_range(0..nodes.len());
        let j = rng.random_range(0..nodes.len());
        if i == j {
            continue;
        }
        let (a, b) = (&nodes[i], &nodes[j]);
        let result = match rng.random_range(0..4) {
            0 => a.and(b),
            1 => a.or(b),
            2 => a.xor(b),
            _ => a.imply(b),
        };
        nodes[i] = result.unwrap();
    }

    let first = nodes[0].clone();
    nodes.iter().skip(1).fold(first, |acc, f| acc.xor(f).unwrap())
}

/// Values of `f` under all `2^n` assignments of the first `n` variables.
pub fn truth_table(f: &Function<'_>, n: usize) -> Vec<bool> {
    (0..1u32 << n)
        .map(|bits| {
            let assignment: Vec<bool> = (0..n).map(|i| bits >> i & 1 == 1).collect();
            f.evaluate(&assignment).unwrap()
        })
        .collect()
}
