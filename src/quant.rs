//! Quantification over the variables of the current association.
//!
//! The recursions stop as soon as the function lies entirely below the
//! lowest quantified level, and cache their results under the association
//! stamp.

use log::debug;

use crate::association::AssocView;
use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::Result;
use crate::reference::Ref;

impl Bdd {
    /// `∃ vars. f`
    pub fn exists(&self, f: Ref) -> Result<Ref> {
        let view = self.current_view();
        self.exists_rec(f, &view)
    }

    /// `∀ vars. f = ¬∃ vars. ¬f`
    pub fn forall(&self, f: Ref) -> Result<Ref> {
        Ok(-self.exists(-f)?)
    }

    fn exists_rec(&self, f: Ref, view: &AssocView) -> Result<Ref> {
        if f.is_terminal() {
            return Ok(f);
        }
        let level = self.level(f);
        if view.is_below(level) {
            return Ok(f);
        }

        let key = OpKey::Exists(f, view.stamp);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            return Ok(res);
        }

        let f0 = self.low_node(f);
        let f1 = self.high_node(f);
        let res = if view.is_quantified(level) {
            let r0 = self.exists_rec(f0, view)?;
            if r0 == Ref::ONE {
                Ref::ONE
            } else {
                let r1 = self.exists_rec(f1, view)?;
                self.apply_or(r0, r1)?
            }
        } else {
            let r0 = self.exists_rec(f0, view)?;
            let r1 = self.exists_rec(f1, view)?;
            self.mk_node(self.var_at(level), r0, r1)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Relational product `∃ vars. f ∧ g`, computed in one pass.
    pub fn rel_prod(&self, f: Ref, g: Ref) -> Result<Ref> {
        let view = self.current_view();
        debug!("rel_prod(f = {}, g = {}) over association stamp {}", f, g, view.stamp);
        self.rel_prod_rec(f, g, &view)
    }

    fn rel_prod_rec(&self, f: Ref, g: Ref, view: &AssocView) -> Result<Ref> {
        if f == Ref::ZERO || g == Ref::ZERO || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == Ref::ONE || f == g {
            return self.exists_rec(g, view);
        }
        if g == Ref::ONE {
            return self.exists_rec(f, view);
        }

        let m = self.level(f).min(self.level(g));
        if view.is_below(m) {
            return self.apply_and(f, g);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let key = OpKey::RelProd(f, g, view.stamp);
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let res = if view.is_quantified(m) {
            let r0 = self.rel_prod_rec(f0, g0, view)?;
            if r0 == Ref::ONE {
                Ref::ONE
            } else {
                let r1 = self.rel_prod_rec(f1, g1, view)?;
                self.apply_or(r0, r1)?
            }
        } else {
            let r0 = self.rel_prod_rec(f0, g0, view)?;
            let r1 = self.rel_prod_rec(f1, g1, view)?;
            self.mk_node(self.var_at(m), r0, r1)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }
}
