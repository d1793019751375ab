use cal_bdd::bdd::Bdd;
use cal_bdd::error::BddError;
use cal_bdd::types::Var;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

mod common;
use common::{random_function, truth_table, vars};

fn random_subset(n: u32, rng: &mut ChaCha8Rng) -> Vec<Var> {
    (1..=n).filter(|_| rng.random_bool(0.4)).map(Var::new).collect()
}

#[test]
fn test_rel_prod_matches_exists_of_and() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 6);
    let mut rng = ChaCha8Rng::seed_from_u64(17);

    for _ in 0..20 {
        let f = random_function(&x, 10, &mut rng);
        let g = random_function(&x, 10, &mut rng);
        let subset = random_subset(6, &mut rng);
        let id = bdd.association_init_vars(&subset).unwrap();
        bdd.association_set_current(id).unwrap();

        let fused = f.rel_prod(&g).unwrap();
        let naive = f.and(&g).unwrap().exists().unwrap();
        assert_eq!(fused, naive, "quantifying {:?}", subset);

        bdd.association_quit(id).unwrap();
    }
    bdd.check_invariants();
}

#[test]
fn test_exists_forall_duality() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for _ in 0..10 {
        let f = random_function(&x, 10, &mut rng);
        let subset = random_subset(5, &mut rng);
        let id = bdd.association_init_vars(&subset).unwrap();
        bdd.association_set_current(id).unwrap();

        let e = f.exists().unwrap();
        let a = f.forall().unwrap();
        assert_eq!(a, f.not().exists().unwrap().not());
        assert!(a.imply(&f).unwrap().is_one());
        assert!(f.imply(&e).unwrap().is_one());
        for var in &subset {
            assert!(!e.depends_on(*var).unwrap());
            assert!(!a.depends_on(*var).unwrap());
        }

        bdd.association_quit(id).unwrap();
    }
}

#[test]
fn test_exists_by_cofactors() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(23);

    for _ in 0..10 {
        let f = random_function(&x, 10, &mut rng);
        let var = Var::new(rng.random_range(1..=5));
        let id = bdd.association_init_vars(&[var]).unwrap();
        bdd.association_set_current(id).unwrap();

        let expected = f.cofactor(var, false).unwrap().or(&f.cofactor(var, true).unwrap()).unwrap();
        assert_eq!(f.exists().unwrap(), expected);
        bdd.association_quit(id).unwrap();
    }
}

#[test]
fn test_compose_is_shannon_expansion() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(31);

    for _ in 0..10 {
        let f = random_function(&x, 10, &mut rng);
        let g = random_function(&x, 6, &mut rng);
        let var = Var::new(rng.random_range(1..=5));

        let composed = f.compose(var, &g).unwrap();
        let f1 = f.cofactor(var, true).unwrap();
        let f0 = f.cofactor(var, false).unwrap();
        assert_eq!(composed, g.ite(&f1, &f0).unwrap());
    }
}

#[test]
fn test_substitute_with_functions() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 4);
    let f = x[0].and(&x[1]).unwrap().or(&x[2]).unwrap();

    // x1 := x3 xor x4, x3 := x1
    let image = x[2].xor(&x[3]).unwrap();
    bdd.temp_association_init(&[(Var::new(1), &image), (Var::new(3), &x[0])])
        .unwrap();
    let expected = image.and(&x[1]).unwrap().or(&x[0]).unwrap();
    assert_eq!(f.substitute().unwrap(), expected);

    // Substitution is simultaneous, so it agrees with a truth-table check.
    let g = f.substitute().unwrap();
    let table = truth_table(&g, 4);
    for (bits, &value) in table.iter().enumerate() {
        let a: Vec<bool> = (0..4).map(|i| bits >> i & 1 == 1).collect();
        let x1 = a[2] ^ a[3];
        assert_eq!(value, (x1 && a[1]) || a[0]);
    }
}

#[test]
fn test_var_substitute_renames() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 6);
    let f = x[0].and(&x[1].not()).unwrap().or(&x[2]).unwrap();

    // Rename x1, x2, x3 to x4, x5, x6.
    bdd.temp_association_init(&[
        (Var::new(1), &x[3]),
        (Var::new(2), &x[4]),
        (Var::new(3), &x[5]),
    ])
    .unwrap();
    let renamed = f.var_substitute().unwrap();
    let expected = x[3].and(&x[4].not()).unwrap().or(&x[5]).unwrap();
    assert_eq!(renamed, expected);
    assert_eq!(renamed, f.substitute().unwrap());

    // A non-literal image is refused.
    let image = x[3].and(&x[4]).unwrap();
    bdd.temp_association_init(&[(Var::new(1), &image)]).unwrap();
    assert!(matches!(f.var_substitute().unwrap_err(), BddError::InvalidArgument { .. }));
}

#[test]
fn test_swap_vars() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 3);
    let f = x[0].and(&x[1].not()).unwrap().or(&x[2]).unwrap();

    let swapped = f.swap_vars(&x[0], &x[2]).unwrap();
    let expected = x[2].and(&x[1].not()).unwrap().or(&x[0]).unwrap();
    assert_eq!(swapped, expected);
    assert_eq!(swapped.swap_vars(&x[0], &x[2]).unwrap(), f);
    assert!(f.swap_vars(&x[0], &f).is_err());
}

#[test]
fn test_care_set_operators() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(41);

    for _ in 0..15 {
        let f = random_function(&x, 10, &mut rng);
        let c = random_function(&x, 6, &mut rng);
        if c.is_zero() {
            continue;
        }
        let on_care = f.and(&c).unwrap();

        let constrained = f.constrain(&c).unwrap();
        assert_eq!(constrained.and(&c).unwrap(), on_care);

        let restricted = f.restrict(&c).unwrap();
        assert_eq!(restricted.and(&c).unwrap(), on_care);
        let restricted_support = restricted.support();
        let f_support = f.support();
        assert!(restricted_support.iter().all(|v| f_support.contains(v)));

        let reduced = f.reduce(&c).unwrap();
        assert_eq!(reduced.and(&c).unwrap(), on_care);
        assert!(reduced.size() <= f.size());
    }
}

#[test]
fn test_between_stays_in_interval() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(43);

    for _ in 0..15 {
        let a = random_function(&x, 8, &mut rng);
        let b = random_function(&x, 8, &mut rng);
        let lower = a.and(&b).unwrap();
        let upper = a.or(&b).unwrap();

        let r = lower.between(&upper).unwrap();
        assert!(lower.imply(&r).unwrap().is_one());
        assert!(r.imply(&upper).unwrap().is_one());
        assert!(r.size() <= lower.size().max(upper.size()));
    }
}

#[test]
fn test_association_lifecycle() {
    let bdd = Bdd::default();
    let x = vars(&bdd, 3);
    let f = x[0].and(&x[1]).unwrap();

    let a = bdd.association_init_vars(&[Var::new(1)]).unwrap();
    let b = bdd.association_init_vars(&[Var::new(1)]).unwrap();
    assert_eq!(a, b);
    let c = bdd.association_init_vars(&[Var::new(2)]).unwrap();
    assert_ne!(a, c);

    bdd.association_set_current(a).unwrap();
    assert_eq!(f.exists().unwrap(), x[1]);
    bdd.association_set_current(c).unwrap();
    assert_eq!(f.exists().unwrap(), x[0]);

    // Two registrations of `a`, so it survives one release.
    bdd.association_quit(a).unwrap();
    assert!(bdd.association_set_current(a).is_ok());
    bdd.association_quit(a).unwrap();
    assert_eq!(
        bdd.association_set_current(a).unwrap_err(),
        BddError::UnknownAssociation { id: a.index() }
    );

    assert!(matches!(
        bdd.association_init_vars(&[Var::new(1), Var::new(1)]).unwrap_err(),
        BddError::InvalidAssociation { .. }
    ));
    assert!(matches!(
        bdd.association_init_vars(&[Var::new(9)]).unwrap_err(),
        BddError::InvalidAssociation { .. }
    ));
    bdd.association_quit(c).unwrap();
}
