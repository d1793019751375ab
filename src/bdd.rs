//! The BDD manager.
//!
//! A [`Bdd`] owns everything: the node arena, one unique subtable per
//! level, the variable order, the operation cache, the association table
//! and the collection/reordering policy. Nothing is global, so independent
//! managers can live side by side (each on its own thread if needed).
//!
//! # Nodes and edges
//!
//! Nodes live in a `Vec<Node>` and are addressed by [`NodeId`]. An edge
//! ([`Ref`]) is a node id plus a complement bit. Node 0 is the single
//! terminal: [`Ref::ONE`] points to it, [`Ref::ZERO`] is its complement.
//!
//! Canonical form is kept by [`Bdd::mk_node`]:
//!
//! - a node whose two children are equal is never created;
//! - the then (high) edge of a stored node is never complemented;
//! - the subtable of the node's level is consulted before allocating.
//!
//! Hence two edges denote the same function iff they are equal.
//!
//! # Handles
//!
//! Raw [`Ref`]s carry no ownership. The methods on `Bdd` that take and
//! return `Ref` never collect garbage, so intermediate results are safe
//! while a computation runs. Across public operations, functions must be
//! held as [`Function`] handles (or protected by [`Bdd::ref_inc`]), since
//! automatic collection and reordering only preserve referenced nodes.
//!
//! ```
//! use cal_bdd::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let x = bdd.new_var_last().unwrap();
//! let y = bdd.new_var_last().unwrap();
//! let f = x.and(&y).unwrap();
//! assert_eq!(f.size(), 2);
//! assert_eq!(x.and(&x.not()).unwrap(), bdd.zero());
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt::{self, Debug};

use log::debug;

use crate::association::Associations;
use crate::block::BlockTree;
use crate::cache::OpCache;
use crate::config::BddConfig;
use crate::error::{BddError, Result};
use crate::function::Function;
use crate::node::Node;
use crate::reference::Ref;
use crate::subtable::Subtable;
use crate::types::{Level, NodeId, Var};

/// Classification of a function, as reported by [`Bdd::bdd_type`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BddType {
    Zero,
    One,
    /// A single positive literal.
    PosVar,
    /// A single negative literal.
    NegVar,
    NonTerminal,
    Null,
}

/// Counters describing the manager state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BddStats {
    pub vars: usize,
    pub nodes: usize,
    pub peak_nodes: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_faults: usize,
    pub cache_clears: usize,
    pub gc_runs: usize,
    pub reorderings: usize,
    pub swaps: usize,
}

pub struct Bdd {
    pub(crate) nodes: RefCell<Vec<Node>>,
    /// Indexed by level.
    pub(crate) subtables: RefCell<Vec<Subtable>>,
    /// Indexed by variable id; entry 0 is unused.
    var_level: RefCell<Vec<usize>>,
    /// Indexed by variable id; entry 0 is unused.
    var_nodes: RefCell<Vec<Ref>>,
    free_head: Cell<NodeId>,
    num_nodes: Cell<usize>,
    peak_nodes: Cell<usize>,
    pub(crate) cache: RefCell<OpCache>,
    pub(crate) associations: RefCell<Associations>,
    pub(crate) blocks: RefCell<BlockTree>,
    config: BddConfig,
    pub(crate) gc_enabled: Cell<bool>,
    pub(crate) gc_limit: Cell<usize>,
    pub(crate) node_limit: Cell<Option<usize>>,
    pub(crate) overflow: Cell<bool>,
    pub(crate) reorder_technique: Cell<crate::config::ReorderTechnique>,
    pub(crate) dynamic_reordering: Cell<bool>,
    pub(crate) reorder_threshold: Cell<usize>,
    pub(crate) gc_runs: Cell<usize>,
    pub(crate) reorderings: Cell<usize>,
    pub(crate) swaps: Cell<usize>,
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        debug!("Creating BDD manager with {:?}", config);
        Self {
            nodes: RefCell::new(vec![Node::terminal()]),
            subtables: RefCell::new(Vec::new()),
            var_level: RefCell::new(vec![usize::MAX]),
            var_nodes: RefCell::new(vec![Ref::INVALID]),
            free_head: Cell::new(Node::NO_NEXT),
            num_nodes: Cell::new(0),
            peak_nodes: Cell::new(0),
            cache: RefCell::new(OpCache::new(config.cache_bits)),
            associations: RefCell::new(Associations::new()),
            blocks: RefCell::new(BlockTree::new()),
            gc_enabled: Cell::new(config.gc_enabled),
            gc_limit: Cell::new(config.gc_limit),
            node_limit: Cell::new(config.node_limit.filter(|&l| l > 0)),
            overflow: Cell::new(false),
            reorder_technique: Cell::new(config.reorder_technique),
            dynamic_reordering: Cell::new(config.dynamic_reordering),
            reorder_threshold: Cell::new(config.reorder_threshold),
            gc_runs: Cell::new(0),
            reorderings: Cell::new(0),
            swaps: Cell::new(0),
            config,
        }
    }

    pub fn config(&self) -> &BddConfig {
        &self.config
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bdd")
            .field("vars", &self.num_vars())
            .field("nodes", &self.num_nodes.get())
            .field("capacity", &self.nodes.borrow().len())
            .finish()
    }
}

// Node store.
impl Bdd {
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> Node {
        self.nodes.borrow()[id.index()]
    }

    pub fn variable(&self, id: NodeId) -> u32 {
        self.nodes.borrow()[id.index()].variable
    }

    pub fn low(&self, id: NodeId) -> Ref {
        self.nodes.borrow()[id.index()].low
    }

    pub fn high(&self, id: NodeId) -> Ref {
        self.nodes.borrow()[id.index()].high
    }

    /// Else-cofactor of `f` with respect to its own top variable.
    pub fn low_node(&self, f: Ref) -> Ref {
        self.low(f.id()).negate_if(f.is_negated())
    }

    /// Then-cofactor of `f` with respect to its own top variable.
    pub fn high_node(&self, f: Ref) -> Ref {
        self.high(f.id()).negate_if(f.is_negated())
    }

    /// Current level of a variable.
    pub fn level_of(&self, var: Var) -> Result<Level> {
        self.check_var(var)?;
        Ok(self.level_of_unchecked(var))
    }

    #[inline]
    pub(crate) fn level_of_unchecked(&self, var: Var) -> Level {
        Level::new(self.var_level.borrow()[var.index()])
    }

    /// Level of the top variable of `f`; terminals are at [`Level::TERMINAL`].
    #[inline]
    pub fn level(&self, f: Ref) -> Level {
        if f.is_terminal() {
            return Level::TERMINAL;
        }
        let var = self.variable(f.id());
        Level::new(self.var_level.borrow()[var as usize])
    }

    /// Variable sitting at `level`.
    pub fn var_at(&self, level: Level) -> Var {
        self.subtables.borrow()[level.index()].variable
    }

    /// Top variable of `f`, `None` for constants.
    pub fn top_var(&self, f: Ref) -> Option<Var> {
        if f.is_terminal() || f.is_invalid() {
            None
        } else {
            Some(Var::new(self.variable(f.id())))
        }
    }

    /// Cofactors of `f` with respect to the variable at `level`.
    ///
    /// If `f` does not start at `level`, both cofactors are `f` itself.
    pub fn top_cofactors(&self, f: Ref, level: Level) -> (Ref, Ref) {
        if f.is_terminal() {
            return (f, f);
        }
        let node = self.node(f.id());
        if self.var_level.borrow()[node.variable as usize] != level.index() {
            return (f, f);
        }
        let n = f.is_negated();
        (node.low.negate_if(n), node.high.negate_if(n))
    }

    /// Number of non-terminal nodes currently allocated (live or dead).
    pub fn node_count(&self) -> usize {
        self.num_nodes.get()
    }

    pub fn num_vars(&self) -> usize {
        self.var_nodes.borrow().len() - 1
    }

    /// Intern the node `(var, low, high)`.
    ///
    /// Returns `low` if both children are equal. If `high` is complemented,
    /// the complement of `(var, ~low, ~high)` is returned instead.
    ///
    /// # Errors
    ///
    /// - [`BddError::UnknownVariable`] if `var` does not exist.
    /// - [`BddError::InvalidArgument`] if a child is null or not strictly
    ///   below `var` in the current order.
    /// - [`BddError::ResourceExhausted`] if a new node is needed and the node
    ///   limit has been reached.
    pub fn mk_node(&self, var: Var, low: Ref, high: Ref) -> Result<Ref> {
        self.check_var(var)?;
        if low.is_invalid() || high.is_invalid() {
            return Err(BddError::invalid_argument("null child"));
        }
        let level = self.level_of_unchecked(var);
        if self.level(low) <= level || self.level(high) <= level {
            return Err(BddError::invalid_argument(format!(
                "children {} and {} are not below {} at {}",
                low, high, var, level
            )));
        }
        self.intern(var.id(), low, high, true)
    }

    pub(crate) fn intern(&self, var: u32, low: Ref, high: Ref, limited: bool) -> Result<Ref> {
        if low == high {
            return Ok(low);
        }
        if high.is_negated() {
            return Ok(-self.intern(var, -low, -high, limited)?);
        }

        let level = self.var_level.borrow()[var as usize];
        debug_assert!(
            level < self.level(low).index() && level < self.level(high).index(),
            "Ordering violated: x{} at L{} above children {} and {}",
            var,
            level,
            low,
            high
        );

        {
            let nodes = self.nodes.borrow();
            let subtables = self.subtables.borrow();
            if let Some(id) = subtables[level].find(low, high, &nodes) {
                return Ok(Ref::positive(id));
            }
        }

        if limited {
            if let Some(limit) = self.node_limit.get() {
                if self.num_nodes.get() >= limit {
                    debug!("mk(x{}, {}, {}): node limit {} reached", var, low, high, limit);
                    return Err(BddError::ResourceExhausted { limit });
                }
            }
        }

        let id = self.alloc(Node::new(var, low, high))?;
        let mut nodes = self.nodes.borrow_mut();
        nodes[low.id().index()].inc_rc();
        nodes[high.id().index()].inc_rc();
        self.subtables.borrow_mut()[level].insert(id, &mut nodes);

        let count = self.num_nodes.get() + 1;
        self.num_nodes.set(count);
        if count > self.peak_nodes.get() {
            self.peak_nodes.set(count);
        }
        Ok(Ref::positive(id))
    }

    fn alloc(&self, node: Node) -> Result<NodeId> {
        let mut nodes = self.nodes.borrow_mut();
        let head = self.free_head.get();
        if head != Node::NO_NEXT {
            self.free_head.set(nodes[head.index()].next);
            nodes[head.index()] = node;
            return Ok(head);
        }
        match u32::try_from(nodes.len()) {
            Ok(raw) if raw <= NodeId::MAX => {
                nodes.push(node);
                Ok(NodeId::new(raw))
            }
            _ => Err(BddError::ResourceExhausted {
                limit: NodeId::MAX as usize,
            }),
        }
    }

    /// Free every node in `stack` whose count is zero, then every child
    /// whose count drops to zero as a consequence.
    ///
    /// Returns the number of freed nodes.
    pub(crate) fn free_dead(&self, mut stack: Vec<NodeId>) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        let mut subtables = self.subtables.borrow_mut();
        let var_level = self.var_level.borrow();
        let mut freed = 0;

        while let Some(id) = stack.pop() {
            let node = nodes[id.index()];
            if node.is_free() || !node.is_dead() {
                continue;
            }
            let level = var_level[node.variable as usize];
            let removed = subtables[level].remove(id, &mut nodes);
            assert!(removed, "Dead node {} missing from its subtable", id);
            for child in [node.low, node.high] {
                if !child.is_terminal() && nodes[child.id().index()].dec_rc() {
                    stack.push(child.id());
                }
            }
            nodes[id.index()].mark_free(self.free_head.get());
            self.free_head.set(id);
            freed += 1;
        }

        self.num_nodes.set(self.num_nodes.get() - freed);
        freed
    }

    /// Ids of all nodes at `level`.
    pub(crate) fn level_ids(&self, level: Level) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        self.subtables.borrow()[level.index()].ids(&nodes)
    }

    /// Number of nodes at each level.
    pub fn level_sizes(&self) -> Vec<usize> {
        self.subtables.borrow().iter().map(|st| st.len()).collect()
    }

    /// Exchange the bookkeeping of levels `level` and `level + 1`.
    pub(crate) fn swap_level_metadata(&self, level: Level) {
        let mut subtables = self.subtables.borrow_mut();
        let mut var_level = self.var_level.borrow_mut();
        let upper = subtables[level.index()].variable;
        let lower = subtables[level.index() + 1].variable;
        subtables.swap(level.index(), level.index() + 1);
        var_level[upper.index()] = level.index() + 1;
        var_level[lower.index()] = level.index();
    }

    /// Move node `id` out of its subtable, rewrite it and put it into the
    /// subtable of its new variable. Counts are not touched.
    pub(crate) fn rewrite_node(&self, id: NodeId, var: u32, low: Ref, high: Ref) {
        debug_assert!(!high.is_negated());
        let mut nodes = self.nodes.borrow_mut();
        let mut subtables = self.subtables.borrow_mut();
        let var_level = self.var_level.borrow();
        nodes[id.index()].variable = var;
        nodes[id.index()].low = low;
        nodes[id.index()].high = high;
        subtables[var_level[var as usize]].insert(id, &mut nodes);
    }

    pub(crate) fn unlink_node(&self, id: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let mut subtables = self.subtables.borrow_mut();
        let var = nodes[id.index()].variable;
        let level = self.var_level.borrow()[var as usize];
        let removed = subtables[level].remove(id, &mut nodes);
        assert!(removed, "Node {} missing from its subtable", id);
    }
}

// Variables.
impl Bdd {
    /// Create a new variable at `level`, pushing the levels below down.
    pub(crate) fn create_var(&self, level: Level) -> Result<Ref> {
        let num_vars = self.num_vars();
        assert!(level.index() <= num_vars, "Level {} out of range", level);
        let id = u32::try_from(num_vars + 1).map_err(|_| BddError::invalid_argument("too many variables"))?;
        let var = Var::new(id);

        {
            let mut var_level = self.var_level.borrow_mut();
            for l in var_level.iter_mut().skip(1) {
                if *l >= level.index() {
                    *l += 1;
                }
            }
            var_level.push(level.index());
        }
        self.subtables
            .borrow_mut()
            .insert(level.index(), Subtable::with_bucket_bits(var, self.config.subtable_bits));
        self.blocks.borrow_mut().insert_level(level.index());

        let f = self.intern(id, Ref::ZERO, Ref::ONE, false)?;
        self.nodes.borrow_mut()[f.id().index()].rc = Node::RC_PINNED;
        self.var_nodes.borrow_mut().push(f);

        debug!("Created variable {} at level {}", var, level);
        Ok(f)
    }

    /// The positive literal of `var`.
    pub fn var_ref(&self, var: Var) -> Result<Ref> {
        self.var_nodes
            .borrow()
            .get(var.index())
            .copied()
            .filter(|r| !r.is_invalid())
            .ok_or(BddError::UnknownVariable { id: var.id() })
    }

    pub(crate) fn check_var(&self, var: Var) -> Result<()> {
        self.var_ref(var).map(|_| ())
    }

    /// Variable of a literal function, if `f` is one.
    pub(crate) fn literal_var(&self, f: Ref) -> Option<Var> {
        let var = self.top_var(f)?;
        let node = self.node(f.id());
        if node.low.is_terminal() && node.high.is_terminal() {
            Some(var)
        } else {
            None
        }
    }

    /// Create a variable above all others.
    pub fn new_var_first(&self) -> Result<Function<'_>> {
        let f = self.create_var(Level::new(0))?;
        Ok(Function::new(self, f))
    }

    /// Create a variable below all others.
    pub fn new_var_last(&self) -> Result<Function<'_>> {
        let f = self.create_var(Level::new(self.num_vars()))?;
        Ok(Function::new(self, f))
    }

    /// Create a variable immediately above the variable `var`.
    pub fn new_var_before(&self, var: &Function<'_>) -> Result<Function<'_>> {
        let level = self.level_of_unchecked(self.literal_of(var)?);
        let f = self.create_var(level)?;
        Ok(Function::new(self, f))
    }

    /// Create a variable immediately below the variable `var`.
    pub fn new_var_after(&self, var: &Function<'_>) -> Result<Function<'_>> {
        let level = self.level_of_unchecked(self.literal_of(var)?);
        let f = self.create_var(level.next())?;
        Ok(Function::new(self, f))
    }

    /// Variable of a positive literal handle.
    pub(crate) fn literal_of(&self, f: &Function<'_>) -> Result<Var> {
        self.check_operand(f)?;
        if f.edge().is_negated() {
            return Err(BddError::invalid_argument(format!("{} is a negative literal", f.edge())));
        }
        self.literal_var(f.edge())
            .ok_or_else(|| BddError::invalid_argument(format!("{} is not a variable", f.edge())))
    }

    /// Handle on the variable with identifier `var`.
    pub fn var(&self, var: Var) -> Result<Function<'_>> {
        let f = self.var_ref(var)?;
        Ok(Function::new(self, f))
    }

    /// Handle on the variable currently at `level`.
    pub fn var_at_level(&self, level: Level) -> Result<Function<'_>> {
        if level.index() >= self.num_vars() {
            return Err(BddError::invalid_argument(format!("no variable at level {}", level)));
        }
        self.var(self.var_at(level))
    }

    /// The current order, top to bottom.
    pub fn var_order(&self) -> Vec<Var> {
        self.subtables.borrow().iter().map(|st| st.variable).collect()
    }

    pub fn one(&self) -> Function<'_> {
        Function::new(self, Ref::ONE)
    }

    pub fn zero(&self) -> Function<'_> {
        Function::new(self, Ref::ZERO)
    }

    /// The null handle. Every operation rejects it.
    pub fn null(&self) -> Function<'_> {
        Function::new(self, Ref::INVALID)
    }

    pub(crate) fn check_operand(&self, f: &Function<'_>) -> Result<()> {
        if !std::ptr::eq(self, f.manager()) {
            return Err(BddError::ForeignManager);
        }
        if f.edge().is_invalid() {
            return Err(BddError::invalid_argument("null operand"));
        }
        Ok(())
    }
}

// Predicates and queries.
impl Bdd {
    pub fn is_zero(&self, f: Ref) -> bool {
        f == Ref::ZERO
    }

    pub fn is_one(&self, f: Ref) -> bool {
        f == Ref::ONE
    }

    pub fn is_const(&self, f: Ref) -> bool {
        f.is_terminal()
    }

    pub fn is_null(&self, f: Ref) -> bool {
        f.is_invalid()
    }

    pub fn bdd_type(&self, f: Ref) -> BddType {
        if f.is_invalid() {
            BddType::Null
        } else if f == Ref::ONE {
            BddType::One
        } else if f == Ref::ZERO {
            BddType::Zero
        } else if self.literal_var(f).is_some() {
            if self.high_node(f) == Ref::ONE {
                BddType::PosVar
            } else {
                BddType::NegVar
            }
        } else {
            BddType::NonTerminal
        }
    }

    /// Whether `f` is a conjunction of literals. `ONE` is the empty cube.
    ///
    /// # Errors
    ///
    /// `ZERO` is not a cube of anything and is rejected.
    pub fn is_cube(&self, f: Ref) -> Result<bool> {
        if f == Ref::ZERO {
            return Err(BddError::invalid_argument("is_cube of the zero function"));
        }
        let mut current = f;
        while !current.is_terminal() {
            let low = self.low_node(current);
            let high = self.high_node(current);
            current = match (low == Ref::ZERO, high == Ref::ZERO) {
                (true, false) => high,
                (false, true) => low,
                _ => return Ok(false),
            };
        }
        Ok(true)
    }

    /// Non-terminal nodes reachable from the given roots.
    pub fn descendants(&self, roots: impl IntoIterator<Item = Ref>) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = roots
            .into_iter()
            .filter(|r| !r.is_terminal() && !r.is_invalid())
            .map(|r| r.id())
            .collect();
        while let Some(id) = stack.pop() {
            if visited.insert(id) {
                let node = self.node(id);
                for child in [node.low, node.high] {
                    if !child.is_terminal() {
                        stack.push(child.id());
                    }
                }
            }
        }
        visited
    }

    /// Number of non-terminal nodes of `f`.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Number of non-terminal nodes shared by all `roots`.
    pub fn size_many(&self, roots: &[Ref]) -> usize {
        self.descendants(roots.iter().copied()).len()
    }

    /// Number of nodes of `roots` at each level.
    pub fn function_profile(&self, roots: &[Ref]) -> Vec<usize> {
        let mut profile = vec![0; self.num_vars()];
        for id in self.descendants(roots.iter().copied()) {
            profile[self.level(Ref::positive(id)).index()] += 1;
        }
        profile
    }

    /// Variables `f` depends on, top to bottom.
    pub fn support(&self, f: Ref) -> Vec<Var> {
        let mut vars: Vec<Var> = self
            .descendants([f])
            .into_iter()
            .map(|id| Var::new(self.variable(id)))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        vars.sort_by_key(|&v| self.level_of_unchecked(v));
        vars
    }

    /// Whether `f` depends on `var`.
    pub fn depends_on(&self, f: Ref, var: Var) -> Result<bool> {
        self.check_var(var)?;
        let target = self.level_of_unchecked(var);
        let mut visited = HashSet::new();
        let mut stack = vec![f];
        while let Some(g) = stack.pop() {
            let level = self.level(g);
            if level > target || !visited.insert(g.id()) {
                continue;
            }
            if level == target {
                return Ok(true);
            }
            stack.push(self.low(g.id()));
            stack.push(self.high(g.id()));
        }
        Ok(false)
    }

    /// The literal of the top variable of `f`.
    pub fn if_var(&self, f: Ref) -> Result<Ref> {
        match self.top_var(f) {
            Some(var) => self.var_ref(var),
            None => Err(BddError::invalid_argument("constant has no top variable")),
        }
    }

    /// Then-cofactor of `f` by its top variable; constants are returned as is.
    pub fn then_branch(&self, f: Ref) -> Ref {
        if f.is_terminal() {
            f
        } else {
            self.high_node(f)
        }
    }

    /// Else-cofactor of `f` by its top variable; constants are returned as is.
    pub fn else_branch(&self, f: Ref) -> Ref {
        if f.is_terminal() {
            f
        } else {
            self.low_node(f)
        }
    }

    pub fn stats(&self) -> BddStats {
        let cache = self.cache.borrow();
        BddStats {
            vars: self.num_vars(),
            nodes: self.num_nodes.get(),
            peak_nodes: self.peak_nodes.get(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            cache_faults: cache.faults(),
            cache_clears: cache.clears(),
            gc_runs: self.gc_runs.get(),
            reorderings: self.reorderings.get(),
            swaps: self.swaps.get(),
        }
    }

    /// Verify every structural invariant of the node store.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found.
    pub fn check_invariants(&self) {
        let nodes = self.nodes.borrow();
        let subtables = self.subtables.borrow();
        let var_level = self.var_level.borrow();

        assert_eq!(subtables.len(), self.num_vars(), "One subtable per variable");
        self.blocks.borrow().check(subtables.len());

        let mut parents = vec![0u64; nodes.len()];
        let mut live = Vec::new();
        for (level, st) in subtables.iter().enumerate() {
            assert_eq!(var_level[st.variable.index()], level, "Level map of {} is stale", st.variable);
            let mut triples = HashSet::new();
            for id in st.ids(&nodes) {
                let node = nodes[id.index()];
                assert!(!node.is_free(), "Free slot {} linked into L{}", id, level);
                assert_eq!(node.variable, st.variable.id(), "Node {} in the wrong subtable", id);
                assert_ne!(node.low, node.high, "Redundant node {}", id);
                assert!(!node.high.is_negated(), "Complemented then-edge at {}", id);
                assert!(triples.insert((node.low, node.high)), "Duplicate node {} at L{}", id, level);
                for child in [node.low, node.high] {
                    if !child.is_terminal() {
                        let child_node = nodes[child.id().index()];
                        assert!(!child_node.is_free(), "Node {} points to free slot {}", id, child.id());
                        assert!(
                            var_level[child_node.variable as usize] > level,
                            "Ordering violated between {} and {}",
                            id,
                            child.id()
                        );
                        parents[child.id().index()] += 1;
                    }
                }
                live.push(id);
            }
        }

        assert_eq!(live.len(), self.num_nodes.get(), "Node count is off");
        let free = nodes.iter().skip(1).filter(|n| n.is_free()).count();
        assert_eq!(live.len() + free + 1, nodes.len(), "Leaked slots");

        for id in live {
            let rc = nodes[id.index()].rc;
            if rc != Node::RC_PINNED {
                assert!(
                    rc as u64 >= parents[id.index()],
                    "Node {} has {} parents but count {}",
                    id,
                    parents[id.index()],
                    rc
                );
            }
        }
    }
}
