//! Reference-counted handles.
//!
//! A [`Function`] pairs an edge with the manager that owns it and keeps the
//! node alive: creating or cloning a handle increments the node's count,
//! dropping it decrements the count. Every operation on handles validates
//! that all operands come from the same manager and then runs under the
//! manager's collection and reordering policy, so results are always
//! returned as new handles.

use std::fmt;

use num_bigint::BigUint;

use crate::bdd::{Bdd, BddType};
use crate::error::Result;
use crate::reference::Ref;
use crate::types::{Level, Var};

pub struct Function<'m> {
    manager: &'m Bdd,
    edge: Ref,
}

impl<'m> Function<'m> {
    pub(crate) fn new(manager: &'m Bdd, edge: Ref) -> Self {
        manager.ref_inc(edge);
        Self { manager, edge }
    }

    /// The raw edge. It stays valid only while some handle keeps it alive.
    pub fn edge(&self) -> Ref {
        self.edge
    }

    pub fn manager(&self) -> &'m Bdd {
        self.manager
    }

    fn unary(&self, op: impl Fn(&Bdd, Ref) -> Result<Ref>) -> Result<Function<'m>> {
        let bdd = self.manager;
        bdd.check_operand(self)?;
        bdd.run_op(|| op(bdd, self.edge))
    }

    fn binary(&self, other: &Function<'_>, op: impl Fn(&Bdd, Ref, Ref) -> Result<Ref>) -> Result<Function<'m>> {
        let bdd = self.manager;
        bdd.check_operand(self)?;
        bdd.check_operand(other)?;
        bdd.run_op(|| op(bdd, self.edge, other.edge))
    }
}

impl Clone for Function<'_> {
    fn clone(&self) -> Self {
        Function::new(self.manager, self.edge)
    }
}

impl Drop for Function<'_> {
    fn drop(&mut self) {
        self.manager.ref_dec(self.edge);
    }
}

impl PartialEq for Function<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.manager, other.manager) && self.edge == other.edge
    }
}

impl Eq for Function<'_> {}

impl fmt::Debug for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.edge)
    }
}

impl fmt::Display for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.edge)
    }
}

// Combination.
impl<'m> Function<'m> {
    pub fn not(&self) -> Function<'m> {
        if self.edge.is_invalid() {
            return self.clone();
        }
        Function::new(self.manager, -self.edge)
    }

    pub fn and(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_and)
    }

    pub fn or(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_or)
    }

    pub fn xor(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_xor)
    }

    pub fn nand(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_nand)
    }

    pub fn nor(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_nor)
    }

    pub fn xnor(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_xnor)
    }

    pub fn imply(&self, other: &Function<'_>) -> Result<Function<'m>> {
        self.binary(other, Bdd::apply_imply)
    }

    /// `if self then g else h`.
    pub fn ite(&self, g: &Function<'_>, h: &Function<'_>) -> Result<Function<'m>> {
        let bdd = self.manager;
        bdd.check_operand(self)?;
        bdd.check_operand(g)?;
        bdd.check_operand(h)?;
        bdd.run_op(|| bdd.apply_ite(self.edge, g.edge, h.edge))
    }
}

// Restriction and transformation.
impl<'m> Function<'m> {
    /// Fix `var` to `value`.
    pub fn cofactor(&self, var: Var, value: bool) -> Result<Function<'m>> {
        self.unary(|bdd, f| bdd.cofactor(f, var, value))
    }

    /// Replace `var` by `g`.
    pub fn compose(&self, var: Var, g: &Function<'_>) -> Result<Function<'m>> {
        self.binary(g, |bdd, f, g| bdd.compose(f, var, g))
    }

    /// Existential quantification over the current association.
    pub fn exists(&self) -> Result<Function<'m>> {
        self.unary(Bdd::exists)
    }

    /// Universal quantification over the current association.
    pub fn forall(&self) -> Result<Function<'m>> {
        self.unary(Bdd::forall)
    }

    /// `∃ vars. self ∧ g` over the current association, without building
    /// the conjunction.
    pub fn rel_prod(&self, g: &Function<'_>) -> Result<Function<'m>> {
        self.binary(g, Bdd::rel_prod)
    }

    /// Simultaneous substitution of the current association.
    pub fn substitute(&self) -> Result<Function<'m>> {
        self.unary(Bdd::substitute)
    }

    /// Variable renaming by the current association.
    pub fn var_substitute(&self) -> Result<Function<'m>> {
        self.unary(Bdd::var_substitute)
    }

    /// Exchange the variables `g` and `h`.
    pub fn swap_vars(&self, g: &Function<'_>, h: &Function<'_>) -> Result<Function<'m>> {
        let bdd = self.manager;
        bdd.check_operand(self)?;
        let g = bdd.literal_of(g)?;
        let h = bdd.literal_of(h)?;
        bdd.run_op(|| bdd.swap_vars(self.edge, g, h))
    }

    /// Generalized cofactor by the care set `c`.
    pub fn constrain(&self, c: &Function<'_>) -> Result<Function<'m>> {
        self.binary(c, Bdd::constrain)
    }

    pub fn restrict(&self, c: &Function<'_>) -> Result<Function<'m>> {
        self.binary(c, Bdd::restrict)
    }

    /// A function agreeing with `self` on `c`, no larger than `self`.
    pub fn reduce(&self, c: &Function<'_>) -> Result<Function<'m>> {
        self.binary(c, Bdd::reduce)
    }

    /// A small function `g` with `self <= g <= upper`.
    pub fn between(&self, upper: &Function<'_>) -> Result<Function<'m>> {
        self.binary(upper, Bdd::between)
    }

    /// A witness cube of `self ∧ g`, zero iff they are disjoint.
    pub fn intersects(&self, g: &Function<'_>) -> Result<Function<'m>> {
        self.binary(g, Bdd::intersects)
    }

    /// A witness of `self ∧ ¬g`, zero iff `self` implies `g`.
    pub fn implies(&self, g: &Function<'_>) -> Result<Function<'m>> {
        self.binary(g, Bdd::implies)
    }
}

// Satisfying assignments.
impl<'m> Function<'m> {
    pub fn satisfy(&self) -> Result<Function<'m>> {
        self.unary(Bdd::satisfy)
    }

    pub fn satisfy_support(&self) -> Result<Function<'m>> {
        self.unary(Bdd::satisfy_support)
    }

    pub fn satisfying_fraction(&self) -> f64 {
        self.manager.satisfying_fraction(self.edge)
    }

    pub fn sat_count(&self, num_vars: usize) -> BigUint {
        self.manager.sat_count(self.edge, num_vars)
    }

    /// Value under an assignment indexed by variable id (`assignment[0]` is `x1`).
    pub fn evaluate(&self, assignment: &[bool]) -> Result<bool> {
        self.manager.check_operand(self)?;
        self.manager.evaluate(self.edge, assignment)
    }
}

// Predicates and queries.
impl<'m> Function<'m> {
    pub fn is_zero(&self) -> bool {
        self.edge == Ref::ZERO
    }

    pub fn is_one(&self) -> bool {
        self.edge == Ref::ONE
    }

    pub fn is_const(&self) -> bool {
        self.edge.is_terminal()
    }

    pub fn is_null(&self) -> bool {
        self.edge.is_invalid()
    }

    pub fn is_cube(&self) -> Result<bool> {
        self.manager.check_operand(self)?;
        self.manager.is_cube(self.edge)
    }

    pub fn size(&self) -> usize {
        self.manager.size(self.edge)
    }

    pub fn depends_on(&self, var: Var) -> Result<bool> {
        self.manager.check_operand(self)?;
        self.manager.depends_on(self.edge, var)
    }

    pub fn support(&self) -> Vec<Var> {
        self.manager.support(self.edge)
    }

    /// Identifier of the top variable, `None` for constants.
    pub fn id(&self) -> Option<Var> {
        self.manager.top_var(self.edge)
    }

    /// Level of the top variable, `None` for constants.
    pub fn index(&self) -> Option<Level> {
        self.id().map(|v| self.manager.level_of_unchecked(v))
    }

    pub fn ref_count(&self) -> u32 {
        self.manager.ref_count(self.edge)
    }

    /// The handle without its complement bit.
    pub fn regular(&self) -> Function<'m> {
        if self.edge.is_invalid() {
            return self.clone();
        }
        Function::new(self.manager, self.edge.regular())
    }

    pub fn if_var(&self) -> Result<Function<'m>> {
        self.manager.check_operand(self)?;
        let f = self.manager.if_var(self.edge)?;
        Ok(Function::new(self.manager, f))
    }

    pub fn then_branch(&self) -> Result<Function<'m>> {
        self.manager.check_operand(self)?;
        Ok(Function::new(self.manager, self.manager.then_branch(self.edge)))
    }

    pub fn else_branch(&self) -> Result<Function<'m>> {
        self.manager.check_operand(self)?;
        Ok(Function::new(self.manager, self.manager.else_branch(self.edge)))
    }

    pub fn bdd_type(&self) -> BddType {
        self.manager.bdd_type(self.edge)
    }
}

// Multi-operand forms on the manager.
impl Bdd {
    pub fn ite<'m>(&'m self, f: &Function<'_>, g: &Function<'_>, h: &Function<'_>) -> Result<Function<'m>> {
        self.check_operand(f)?;
        self.check_operand(g)?;
        self.check_operand(h)?;
        self.run_op(|| self.apply_ite(f.edge, g.edge, h.edge))
    }

    fn edges(&self, fs: &[&Function<'_>]) -> Result<Vec<Ref>> {
        fs.iter()
            .map(|f| self.check_operand(f).map(|_| f.edge))
            .collect()
    }

    pub fn and_many(&self, fs: &[&Function<'_>]) -> Result<Function<'_>> {
        let edges = self.edges(fs)?;
        self.run_op(|| self.apply_and_many(edges.iter().copied()))
    }

    pub fn or_many(&self, fs: &[&Function<'_>]) -> Result<Function<'_>> {
        let edges = self.edges(fs)?;
        self.run_op(|| self.apply_or_many(edges.iter().copied()))
    }

    pub fn xor_many(&self, fs: &[&Function<'_>]) -> Result<Function<'_>> {
        let edges = self.edges(fs)?;
        self.run_op(|| self.apply_xor_many(edges.iter().copied()))
    }

    fn pairwise<'m>(
        &'m self,
        pairs: &[(&Function<'_>, &Function<'_>)],
        op: impl Fn(&Bdd, Ref, Ref) -> Result<Ref>,
    ) -> Result<Vec<Function<'m>>> {
        let mut edges = Vec::with_capacity(pairs.len());
        for (f, g) in pairs {
            self.check_operand(f)?;
            self.check_operand(g)?;
            edges.push((f.edge, g.edge));
        }
        // Each result is protected by its handle before the next one runs.
        edges.into_iter().map(|(f, g)| self.run_op(|| op(self, f, g))).collect()
    }

    pub fn and_pairwise<'m>(&'m self, pairs: &[(&Function<'_>, &Function<'_>)]) -> Result<Vec<Function<'m>>> {
        self.pairwise(pairs, Bdd::apply_and)
    }

    pub fn or_pairwise<'m>(&'m self, pairs: &[(&Function<'_>, &Function<'_>)]) -> Result<Vec<Function<'m>>> {
        self.pairwise(pairs, Bdd::apply_or)
    }

    pub fn xor_pairwise<'m>(&'m self, pairs: &[(&Function<'_>, &Function<'_>)]) -> Result<Vec<Function<'m>>> {
        self.pairwise(pairs, Bdd::apply_xor)
    }

    /// Number of nodes shared by the given functions.
    pub fn size_of(&self, fs: &[&Function<'_>]) -> usize {
        let edges: Vec<Ref> = fs.iter().map(|f| f.edge).collect();
        self.size_many(&edges)
    }

    /// Node count per level of the given functions.
    pub fn profile_of(&self, fs: &[&Function<'_>]) -> Vec<usize> {
        let edges: Vec<Ref> = fs.iter().map(|f| f.edge).collect();
        self.function_profile(&edges)
    }
}
