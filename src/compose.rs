//! Restriction, composition and substitution.

use std::collections::HashMap;

use log::debug;

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::{Level, Var};

/// Memo table of a substitution pass.
///
/// Association-driven substitutions share the operation cache under the
/// association stamp; one-off substitutions keep a private table.
enum Memo {
    Shared { stamp: u32, vars_only: bool },
    Local(HashMap<Ref, Ref>),
}

impl Memo {
    fn key(&self, f: Ref) -> Option<OpKey> {
        match *self {
            Memo::Shared { stamp, vars_only: false } => Some(OpKey::Substitute(f, stamp)),
            Memo::Shared { stamp, vars_only: true } => Some(OpKey::VarSubstitute(f, stamp)),
            Memo::Local(_) => None,
        }
    }

    fn get(&mut self, bdd: &Bdd, f: Ref) -> Option<Ref> {
        match self.key(f) {
            Some(key) => bdd.cache.borrow_mut().get(&key),
            None => match self {
                Memo::Local(map) => map.get(&f).copied(),
                Memo::Shared { .. } => None,
            },
        }
    }

    fn insert(&mut self, bdd: &Bdd, f: Ref, res: Ref) {
        match self.key(f) {
            Some(key) => bdd.cache.borrow_mut().insert(key, res),
            None => {
                if let Memo::Local(map) = self {
                    map.insert(f, res);
                }
            }
        }
    }
}

impl Bdd {
    /// `f|var<-value`.
    pub fn cofactor(&self, f: Ref, var: Var, value: bool) -> Result<Ref> {
        self.check_var(var)?;
        let mut memo = HashMap::new();
        self.cofactor_rec(f, self.level_of_unchecked(var), value, &mut memo)
    }

    fn cofactor_rec(&self, f: Ref, level: Level, value: bool, memo: &mut HashMap<Ref, Ref>) -> Result<Ref> {
        let i = self.level(f);
        if level < i {
            // 'f' does not depend on the variable
            return Ok(f);
        }
        if level == i {
            return Ok(if value { self.high_node(f) } else { self.low_node(f) });
        }

        if let Some(&res) = memo.get(&f) {
            return Ok(res);
        }
        let low = self.cofactor_rec(self.low_node(f), level, value, memo)?;
        let high = self.cofactor_rec(self.high_node(f), level, value, memo)?;
        let res = self.mk_node(self.var_at(i), low, high)?;
        memo.insert(f, res);
        Ok(res)
    }

    /// `f|var<-g`.
    pub fn compose(&self, f: Ref, var: Var, g: Ref) -> Result<Ref> {
        self.check_var(var)?;
        let mut memo = HashMap::new();
        self.compose_rec(f, self.level_of_unchecked(var), g, &mut memo)
    }

    fn compose_rec(&self, f: Ref, level: Level, g: Ref, memo: &mut HashMap<(Ref, Ref), Ref>) -> Result<Ref> {
        debug!("compose(f = {}, {}, g = {})", f, level, g);

        let i = self.level(f);
        if level < i {
            return Ok(f);
        }

        let key = (f, g);
        if let Some(&res) = memo.get(&key) {
            return Ok(res);
        }

        let res = if level == i {
            self.apply_ite(g, self.high_node(f), self.low_node(f))?
        } else {
            let m = i.min(self.level(g));
            let (f0, f1) = self.top_cofactors(f, m);
            let (g0, g1) = self.top_cofactors(g, m);
            let h0 = self.compose_rec(f0, level, g0, memo)?;
            let h1 = self.compose_rec(f1, level, g1, memo)?;
            self.mk_node(self.var_at(m), h0, h1)?
        };
        memo.insert(key, res);
        Ok(res)
    }

    /// Replace every variable of the current association by its image,
    /// simultaneously.
    pub fn substitute(&self, f: Ref) -> Result<Ref> {
        let view = self.current_view();
        let mut memo = Memo::Shared {
            stamp: view.stamp,
            vars_only: false,
        };
        self.substitute_rec(f, &view.images, view.max_level, &mut memo)
    }

    /// Rename variables by the current association, whose images must all
    /// be positive literals.
    pub fn var_substitute(&self, f: Ref) -> Result<Ref> {
        let view = self.current_view();
        for (var, &image) in view.images.iter().enumerate() {
            if image.is_invalid() {
                continue;
            }
            if image.is_negated() || self.literal_var(image).is_none() {
                return Err(BddError::invalid_argument(format!(
                    "x{} is mapped to {}, which is not a variable",
                    var, image
                )));
            }
        }
        let mut memo = Memo::Shared {
            stamp: view.stamp,
            vars_only: true,
        };
        self.substitute_rec(f, &view.images, view.max_level, &mut memo)
    }

    /// Exchange the variables `g` and `h` in `f`.
    pub fn swap_vars(&self, f: Ref, g: Var, h: Var) -> Result<Ref> {
        self.check_var(g)?;
        self.check_var(h)?;
        let mut images = vec![Ref::INVALID; self.num_vars() + 1];
        images[g.index()] = self.var_ref(h)?;
        images[h.index()] = self.var_ref(g)?;
        let max_level = self.level_of_unchecked(g).max(self.level_of_unchecked(h));
        let mut memo = Memo::Local(HashMap::new());
        self.substitute_rec(f, &images, Some(max_level), &mut memo)
    }

    fn substitute_rec(&self, f: Ref, images: &[Ref], max_level: Option<Level>, memo: &mut Memo) -> Result<Ref> {
        let level = self.level(f);
        if max_level.map_or(true, |max| level > max) {
            return Ok(f);
        }

        // Substitution commutes with negation.
        let n = f.is_negated();
        let f = f.regular();
        if let Some(res) = memo.get(self, f) {
            return Ok(res.negate_if(n));
        }

        let var = self.variable(f.id());
        let low = self.substitute_rec(self.low(f.id()), images, max_level, memo)?;
        let high = self.substitute_rec(self.high(f.id()), images, max_level, memo)?;
        let image = match images.get(var as usize) {
            Some(&g) if !g.is_invalid() => g,
            _ => self.var_ref(Var::new(var))?,
        };
        let res = self.apply_ite(image, high, low)?;

        memo.insert(self, f, res);
        Ok(res.negate_if(n))
    }

    /// Generalized cofactor of `f` by `g`: agrees with `f` wherever `g`
    /// holds, and maps every other point to the nearest point of `g`.
    pub fn constrain(&self, f: Ref, g: Ref) -> Result<Ref> {
        debug!("constrain(f = {}, g = {})", f, g);

        if g == Ref::ZERO {
            debug!("g is zero => f|g = 0");
            return Ok(Ref::ZERO);
        }
        if g == Ref::ONE || f.is_terminal() {
            return Ok(f);
        }
        if f == g {
            return Ok(Ref::ONE);
        }
        if f == -g {
            return Ok(Ref::ZERO);
        }

        let key = OpKey::Constrain(f, g);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            debug!("cache: constrain(f = {}, g = {}) -> {}", f, g, res);
            return Ok(res);
        }

        let m = self.level(f).min(self.level(g));
        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);

        let res = if g1 == Ref::ZERO {
            self.constrain(f0, g0)?
        } else if g0 == Ref::ZERO {
            self.constrain(f1, g1)?
        } else {
            let low = self.constrain(f0, g0)?;
            let high = self.constrain(f1, g1)?;
            self.mk_node(self.var_at(m), low, high)?
        };
        debug!("computed: constrain(f = {}, g = {}) -> {}", f, g, res);

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Coudert-Madre restrict: like [`Bdd::constrain`], but variables that
    /// `f` does not test are quantified out of the care set instead of
    /// being introduced into the result.
    ///
    /// An empty care set leaves `f` unchanged.
    pub fn restrict(&self, f: Ref, c: Ref) -> Result<Ref> {
        if c == Ref::ZERO || c == Ref::ONE || f.is_terminal() {
            return Ok(f);
        }
        if f == c {
            return Ok(Ref::ONE);
        }
        if f == -c {
            return Ok(Ref::ZERO);
        }

        let key = OpKey::Restrict(f, c);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            return Ok(res);
        }

        let i = self.level(f);
        let m = i.min(self.level(c));
        let (c0, c1) = self.top_cofactors(c, m);

        let res = if i > m {
            let c = self.apply_or(c0, c1)?;
            self.restrict(f, c)?
        } else {
            let (f0, f1) = self.top_cofactors(f, m);
            if c0 == Ref::ZERO {
                self.restrict(f1, c1)?
            } else if c1 == Ref::ZERO {
                self.restrict(f0, c0)?
            } else {
                let low = self.restrict(f0, c0)?;
                let high = self.restrict(f1, c1)?;
                self.mk_node(self.var_at(m), low, high)?
            }
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// A function agreeing with `f` wherever `c` holds, never larger than `f`.
    pub fn reduce(&self, f: Ref, c: Ref) -> Result<Ref> {
        let r = self.restrict(f, c)?;
        if self.size(r) < self.size(f) {
            Ok(r)
        } else {
            Ok(f)
        }
    }

    /// The smallest of `f_min`, `f_max` and a restriction of `f_min` to the
    /// points where `f_min` and `f_max` agree; every candidate `g` satisfies
    /// `f_min <= g <= f_max` when `f_min` implies `f_max`.
    pub fn between(&self, f_min: Ref, f_max: Ref) -> Result<Ref> {
        let care = self.apply_or(f_min, -f_max)?;
        let r = self.restrict(f_min, care)?;
        let min_size = self.size(f_min);
        let max_size = self.size(f_max);
        let r_size = self.size(r);
        if r_size < min_size {
            if r_size < max_size {
                Ok(r)
            } else {
                Ok(f_max)
            }
        } else if min_size < max_size {
            Ok(f_min)
        } else {
            Ok(f_max)
        }
    }
}
