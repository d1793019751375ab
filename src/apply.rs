//! The ITE evaluator and the Boolean connectives.
//!
//! `ite(F, G, H) = (F ∧ G) ∨ (¬F ∧ H)` is the universal combinator. Before
//! recursing, terminal cases are resolved and the triple is brought into a
//! standard form so that equivalent calls share one cache entry:
//!
//! - constants and repeated operands are replaced (`ite(F,F,H) = ite(F,1,H)`);
//! - triples that reduce to a binary connective (`ite(F,G,0) = F ∧ G`) are
//!   handed to its dedicated recursion, which orders commutative operands
//!   by raw edge value;
//! - the first two operands are made regular, the complement moving to the
//!   result (`ite(~F,G,H) = ite(F,H,G)`, `ite(F,~G,H) = ~ite(F,G,~H)`).
//!
//! Conjunction and exclusive or have their own recursions and cache tags;
//! the other binary connectives are complement-edge variations of them.

use std::collections::HashSet;

use log::debug;

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::Result;
use crate::reference::Ref;
use crate::types::Level;

impl Bdd {
    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if f == Ref::ONE {
            return Ok(g);
        }
        if f == Ref::ZERO {
            return Ok(h);
        }

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => F
        if g == h {
            return Ok(g);
        }
        if g == Ref::ONE && h == Ref::ZERO {
            return Ok(f);
        }
        if g == Ref::ZERO && h == Ref::ONE {
            return Ok(-f);
        }
        if g == Ref::ONE && h == -f {
            return Ok(Ref::ONE);
        }
        if g == f && h == Ref::ONE {
            return Ok(Ref::ONE);
        }
        if g == -f && h == Ref::ZERO {
            return Ok(Ref::ZERO);
        }
        if g == Ref::ZERO && h == f {
            return Ok(f);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, Ref::ONE, h);
        }
        if h == f {
            return self.apply_ite(f, g, Ref::ZERO);
        }
        if g == -f {
            return self.apply_ite(f, Ref::ZERO, h);
        }
        if h == -f {
            return self.apply_ite(f, g, Ref::ONE);
        }

        // Binary cases go to the dedicated recursions.
        if h == Ref::ZERO {
            return self.apply_and(f, g);
        }
        if g == Ref::ONE {
            return self.apply_or(f, h);
        }
        if g == Ref::ZERO {
            return self.apply_and(-f, h);
        }
        if h == Ref::ONE {
            return self.apply_or(-f, g);
        }
        if g == -h {
            return self.apply_xor(f, h);
        }

        let (mut f, mut g, mut h) = (f, g, h);

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let n = g.is_negated();
        if n {
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            debug!("cache: apply_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
            return Ok(res.negate_if(n));
        }

        let m = self.level(f).min(self.level(g)).min(self.level(h));
        let var = self.var_at(m);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0)?;
        let t = self.apply_ite(f1, g1, h1)?;

        let res = self.mk_node(var, e, t)?;
        debug!("computed: apply_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
        self.cache.borrow_mut().insert(key, res);

        Ok(res.negate_if(n))
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, f: Ref, g: Ref) -> Result<Ref> {
        if f == Ref::ZERO || g == Ref::ZERO || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == Ref::ONE || f == g {
            return Ok(g);
        }
        if g == Ref::ONE {
            return Ok(f);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let key = OpKey::And(f, g);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            return Ok(res);
        }

        let m = self.level(f).min(self.level(g));
        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let e = self.apply_and(f0, g0)?;
        let t = self.apply_and(f1, g1)?;
        let res = self.mk_node(self.var_at(m), e, t)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    pub fn apply_or(&self, f: Ref, g: Ref) -> Result<Ref> {
        Ok(-self.apply_and(-f, -g)?)
    }

    pub fn apply_nand(&self, f: Ref, g: Ref) -> Result<Ref> {
        Ok(-self.apply_and(f, g)?)
    }

    pub fn apply_nor(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.apply_and(-f, -g)
    }

    pub fn apply_xor(&self, f: Ref, g: Ref) -> Result<Ref> {
        if f == g {
            return Ok(Ref::ZERO);
        }
        if f == -g {
            return Ok(Ref::ONE);
        }
        if f.is_terminal() {
            return Ok(g.negate_if(f == Ref::ONE));
        }
        if g.is_terminal() {
            return Ok(f.negate_if(g == Ref::ONE));
        }

        // x ⊕ y = ~x ⊕ ~y, so both operands can be made regular.
        let n = f.is_negated() != g.is_negated();
        let (f, g) = (f.regular(), g.regular());
        let (f, g) = if f <= g { (f, g) } else { (g, f) };

        let key = OpKey::Xor(f, g);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            return Ok(res.negate_if(n));
        }

        let m = self.level(f).min(self.level(g));
        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let e = self.apply_xor(f0, g0)?;
        let t = self.apply_xor(f1, g1)?;
        let res = self.mk_node(self.var_at(m), e, t)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res.negate_if(n))
    }

    pub fn apply_xnor(&self, f: Ref, g: Ref) -> Result<Ref> {
        Ok(-self.apply_xor(f, g)?)
    }

    pub fn apply_imply(&self, f: Ref, g: Ref) -> Result<Ref> {
        Ok(-self.apply_and(f, -g)?)
    }

    pub fn apply_and_many(&self, fs: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut res = Ref::ONE;
        for f in fs {
            res = self.apply_and(res, f)?;
            if res == Ref::ZERO {
                break;
            }
        }
        Ok(res)
    }

    pub fn apply_or_many(&self, fs: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut res = Ref::ZERO;
        for f in fs {
            res = self.apply_or(res, f)?;
            if res == Ref::ONE {
                break;
            }
        }
        Ok(res)
    }

    pub fn apply_xor_many(&self, fs: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut res = Ref::ZERO;
        for f in fs {
            res = self.apply_xor(res, f)?;
        }
        Ok(res)
    }

    /// Conjunction of each pair.
    pub fn apply_and_pairwise(&self, pairs: &[(Ref, Ref)]) -> Result<Vec<Ref>> {
        pairs.iter().map(|&(f, g)| self.apply_and(f, g)).collect()
    }

    /// Disjunction of each pair.
    pub fn apply_or_pairwise(&self, pairs: &[(Ref, Ref)]) -> Result<Vec<Ref>> {
        pairs.iter().map(|&(f, g)| self.apply_or(f, g)).collect()
    }

    /// Exclusive or of each pair.
    pub fn apply_xor_pairwise(&self, pairs: &[(Ref, Ref)]) -> Result<Vec<Ref>> {
        pairs.iter().map(|&(f, g)| self.apply_xor(f, g)).collect()
    }

    /// A cube-like function implying `f ∧ g`, or `ZERO` if they are disjoint.
    ///
    /// The witness is built along one path, so it is never larger than the
    /// number of levels, and `f ∧ g` is not materialized.
    pub fn intersects(&self, f: Ref, g: Ref) -> Result<Ref> {
        let mut disjoint = HashSet::new();
        self.intersects_rec(f, g, &mut disjoint)
    }

    fn intersects_rec(&self, f: Ref, g: Ref, disjoint: &mut HashSet<(Ref, Ref)>) -> Result<Ref> {
        if f == Ref::ZERO || g == Ref::ZERO || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == Ref::ONE || f == g {
            return Ok(g);
        }
        if g == Ref::ONE {
            return Ok(f);
        }
        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        if disjoint.contains(&(f, g)) {
            return Ok(Ref::ZERO);
        }

        let m: Level = self.level(f).min(self.level(g));
        let var = self.var_at(m);
        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);

        let t = self.intersects_rec(f1, g1, disjoint)?;
        if t != Ref::ZERO {
            return self.mk_node(var, Ref::ZERO, t);
        }
        let e = self.intersects_rec(f0, g0, disjoint)?;
        if e != Ref::ZERO {
            return self.mk_node(var, e, Ref::ZERO);
        }
        disjoint.insert((f, g));
        Ok(Ref::ZERO)
    }

    /// A witness of `f ∧ ¬g`; `ZERO` iff `f` implies `g`.
    pub fn implies(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.intersects(f, -g)
    }
}
