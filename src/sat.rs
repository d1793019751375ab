use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::{Level, Var};

impl Bdd {
    /// Build the cube of the given literals, which must be listed top to
    /// bottom in the current order.
    fn build_cube(&self, literals: &[(Var, bool)]) -> Result<Ref> {
        let mut res = Ref::ONE;
        for &(var, value) in literals.iter().rev() {
            res = if value {
                self.mk_node(var, Ref::ZERO, res)?
            } else {
                self.mk_node(var, res, Ref::ZERO)?
            };
        }
        Ok(res)
    }

    /// A cube implying `f`, one literal per node on a path to `ONE`.
    ///
    /// The then-branch is preferred whenever it is satisfiable.
    /// `satisfy(ZERO)` is `ZERO`.
    pub fn satisfy(&self, f: Ref) -> Result<Ref> {
        if f == Ref::ZERO {
            return Ok(Ref::ZERO);
        }

        let mut path = Vec::new();
        let mut current = f;

        // Walk down, always picking a satisfiable branch
        while current != Ref::ONE {
            let var = Var::new(self.variable(current.id()));
            let high = self.high_node(current);
            if high != Ref::ZERO {
                path.push((var, true));
                current = high;
            } else {
                path.push((var, false));
                current = self.low_node(current);
            }
        }

        self.build_cube(&path)
    }

    /// A minterm over the variables of the current association implying `f`.
    ///
    /// Association variables that `f` does not test on the chosen path are
    /// set false. Variables of `f` outside the association are chosen as in
    /// [`Bdd::satisfy`].
    pub fn satisfy_support(&self, f: Ref) -> Result<Ref> {
        if f == Ref::ZERO {
            return Ok(Ref::ZERO);
        }

        let view = self.current_view();
        let mut support: Vec<Level> = (0..self.num_vars())
            .map(Level::new)
            .filter(|&l| view.is_quantified(l))
            .collect();
        support.reverse();

        let mut literals = Vec::new();
        let mut current = f;
        while current != Ref::ONE {
            let level = self.level(current);
            while let Some(&next) = support.last() {
                if next > level {
                    break;
                }
                support.pop();
                if next < level {
                    literals.push((self.var_at(next), false));
                }
            }
            let var = self.var_at(level);
            let high = self.high_node(current);
            if high != Ref::ZERO {
                literals.push((var, true));
                current = high;
            } else {
                literals.push((var, false));
                current = self.low_node(current);
            }
        }
        while let Some(next) = support.pop() {
            literals.push((self.var_at(next), false));
        }

        self.build_cube(&literals)
    }

    /// Fraction of all assignments that satisfy `f`.
    pub fn satisfying_fraction(&self, f: Ref) -> f64 {
        if f.is_invalid() {
            return 0.0;
        }
        let mut cache = HashMap::new();
        self.satisfying_fraction_rec(f, &mut cache)
    }

    fn satisfying_fraction_rec(&self, f: Ref, cache: &mut HashMap<Ref, f64>) -> f64 {
        if f.is_terminal() {
            return if f == Ref::ONE { 1.0 } else { 0.0 };
        }

        let node = f.regular();
        let fraction = match cache.get(&node) {
            Some(&x) => x,
            None => {
                let low = self.satisfying_fraction_rec(self.low(node.id()), cache);
                let high = self.satisfying_fraction_rec(self.high(node.id()), cache);
                let x = 0.5 * low + 0.5 * high;
                cache.insert(node, x);
                x
            }
        };

        if f.is_negated() {
            1.0 - fraction
        } else {
            fraction
        }
    }

    /// Number of satisfying assignments of `f` over `num_vars` variables.
    pub fn sat_count(&self, f: Ref, num_vars: usize) -> BigUint {
        if f.is_invalid() {
            return BigUint::ZERO;
        }
        let mut cache = HashMap::new();
        let max = BigUint::from(2u32).pow(num_vars as u32);
        self.sat_count_rec(f, &max, &mut cache)
    }

    fn sat_count_rec(&self, f: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if f == Ref::ZERO {
            return BigUint::ZERO;
        } else if f == Ref::ONE {
            return max.clone();
        }

        if let Some(count) = cache.get(&f) {
            return count.clone();
        }

        let low = self.low(f.id());
        let high = self.high(f.id());

        let count_low = self.sat_count_rec(low, max, cache);
        let count_high = self.sat_count_rec(high, max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if f.is_negated() { max - count } else { count };

        cache.insert(f, count.clone());
        count
    }

    /// Value of `f` under `assignment`, where `assignment[i]` is the value of
    /// the variable with identifier `i + 1`.
    ///
    /// # Errors
    ///
    /// [`BddError::InvalidArgument`] if `f` tests a variable the assignment
    /// does not cover.
    pub fn evaluate(&self, f: Ref, assignment: &[bool]) -> Result<bool> {
        let mut current = f;
        while !current.is_terminal() {
            let var = self.variable(current.id());
            let value = assignment.get(var as usize - 1).copied().ok_or_else(|| {
                BddError::invalid_argument(format!("no value for x{} in an assignment of {}", var, assignment.len()))
            })?;
            current = if value {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        Ok(current == Ref::ONE)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn setup(n: usize) -> (Bdd, Vec<Ref>) {
        let bdd = Bdd::default();
        let vars = (0..n).map(|_| bdd.create_var(Level::new(bdd.num_vars())).unwrap()).collect();
        (bdd, vars)
    }

    #[test]
    fn test_satisfy() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_ite(x[0], x[1], x[2]).unwrap();

        let s = bdd.satisfy(f).unwrap();
        assert!(bdd.is_cube(s).unwrap());
        assert_eq!(s, bdd.apply_and(x[0], x[1]).unwrap());
        assert_eq!(bdd.apply_and(s, -f).unwrap(), Ref::ZERO);

        let s = bdd.satisfy(-f).unwrap();
        assert_eq!(s, bdd.apply_and(x[0], -x[1]).unwrap());
        assert_eq!(bdd.satisfy(Ref::ZERO).unwrap(), Ref::ZERO);
        assert_eq!(bdd.satisfy(Ref::ONE).unwrap(), Ref::ONE);
    }

    #[test]
    fn test_satisfy_support() {
        let (bdd, x) = setup(4);
        let f = bdd.apply_or(x[1], x[3]).unwrap();

        let vars: Vec<Var> = (1..=4).map(Var::new).collect();
        let id = bdd.association_init_vars(&vars).unwrap();
        bdd.association_set_current(id).unwrap();

        // x1 and x3 are skipped (false), x2 is chosen true.
        let s = bdd.satisfy_support(f).unwrap();
        let expected = bdd.apply_and_many([-x[0], x[1], -x[2], -x[3]]).unwrap();
        assert_eq!(s, expected);

        // Trailing association variables are set false too.
        let s = bdd.satisfy_support(Ref::ONE).unwrap();
        assert_eq!(bdd.size(s), 4);
        assert_eq!(bdd.satisfy_support(Ref::ZERO).unwrap(), Ref::ZERO);
    }

    #[test]
    fn test_satisfy_support_outside_association() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_and(-x[0], x[2]).unwrap();

        let id = bdd.association_init_vars(&[Var::new(2)]).unwrap();
        bdd.association_set_current(id).unwrap();

        let s = bdd.satisfy_support(f).unwrap();
        assert_eq!(s, bdd.apply_and_many([-x[0], -x[1], x[2]]).unwrap());
    }

    #[test]
    fn test_satisfying_fraction() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_and(x[0], x[1]).unwrap();
        assert_eq!(bdd.satisfying_fraction(f), 0.25);
        assert_eq!(bdd.satisfying_fraction(-f), 0.75);
        let g = bdd.apply_xor(x[0], x[2]).unwrap();
        assert_eq!(bdd.satisfying_fraction(g), 0.5);
        assert_eq!(bdd.satisfying_fraction(Ref::ONE), 1.0);
    }

    #[test]
    fn test_sat_count_terminal() {
        let bdd = Bdd::default();

        assert_eq!(bdd.sat_count(Ref::ZERO, 3), BigUint::from(0u32));
        assert_eq!(bdd.sat_count(Ref::ONE, 1), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(Ref::ONE, 3), BigUint::from(8u32));
    }

    #[test]
    fn test_sat_count_clause() {
        let (bdd, x) = setup(2);
        let f = bdd.apply_or(x[0], x[1]).unwrap();

        assert_eq!(bdd.sat_count(f, 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(f, 3), BigUint::from(6u32));
        assert_eq!(bdd.sat_count(-f, 4), BigUint::from(4u32));
    }

    #[test]
    fn test_evaluate() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_ite(x[0], x[1], x[2]).unwrap();

        assert!(bdd.evaluate(f, &[true, true, false]).unwrap());
        assert!(!bdd.evaluate(f, &[true, false, true]).unwrap());
        assert!(bdd.evaluate(f, &[false, false, true]).unwrap());
        assert!(!bdd.evaluate(-f, &[false, false, true]).unwrap());
        assert!(bdd.evaluate(f, &[true]).is_err());
    }
}
