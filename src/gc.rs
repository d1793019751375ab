//! Reference counting and garbage collection.
//!
//! Every node carries a count of the edges pointing at it: one per parent
//! node plus one per external reference ([`Function`] handle, association
//! entry or explicit [`Bdd::ref_inc`]). A node whose count is zero is
//! *dead*: it stays in the unique table, and may even be revived by a later
//! lookup, until a collection frees it.
//!
//! Collection is safe without tracing because the node graph is acyclic:
//! freeing a dead node decrements its children, which are freed in turn if
//! they die.
//!
//! Collections never run inside a recursive operation. In automatic mode
//! they run between public operations, once the node count exceeds the
//! collection limit, and before a node-limit failure is reported.

use log::{debug, info, warn};

use crate::bdd::Bdd;
use crate::config::{ReorderTechnique, MIN_GC_LIMIT};
use crate::error::Result;
use crate::function::Function;
use crate::reference::Ref;

impl Bdd {
    /// Add an external reference to `f`.
    pub fn ref_inc(&self, f: Ref) {
        if f.is_terminal() || f.is_invalid() {
            return;
        }
        self.nodes.borrow_mut()[f.id().index()].inc_rc();
    }

    /// Drop an external reference to `f`. The node is not freed until the
    /// next collection.
    pub fn ref_dec(&self, f: Ref) {
        if f.is_terminal() || f.is_invalid() {
            return;
        }
        self.nodes.borrow_mut()[f.id().index()].dec_rc();
    }

    /// Current reference count of the node behind `f`.
    pub fn ref_count(&self, f: Ref) -> u32 {
        if f.is_invalid() {
            return 0;
        }
        self.nodes.borrow()[f.id().index()].rc
    }

    /// Free every unreferenced node.
    ///
    /// Returns the number of freed nodes. The operation cache is cleared,
    /// since freed slots will be reused.
    pub fn collect_garbage(&self) -> usize {
        let before = self.node_count();
        let dead = {
            let nodes = self.nodes.borrow();
            let subtables = self.subtables.borrow();
            subtables
                .iter()
                .flat_map(|st| st.ids(&nodes))
                .filter(|id| nodes[id.index()].is_dead())
                .collect::<Vec<_>>()
        };
        let freed = self.free_dead(dead);
        self.cache.borrow_mut().clear();
        self.gc_runs.set(self.gc_runs.get() + 1);
        info!("Garbage collection: {} -> {} nodes ({} freed)", before, self.node_count(), freed);
        freed
    }

    /// Enable or disable automatic collection.
    pub fn set_gc_mode(&self, enabled: bool) {
        debug!("GC mode: {}", if enabled { "automatic" } else { "manual" });
        self.gc_enabled.set(enabled);
    }

    pub fn gc_mode(&self) -> bool {
        self.gc_enabled.get()
    }

    /// Node count above which automatic collection runs.
    pub fn set_gc_limit(&self, limit: usize) {
        self.gc_limit.set(limit);
    }

    pub fn gc_limit(&self) -> usize {
        self.gc_limit.get()
    }

    /// Recompute the collection limit from the current node count.
    pub(crate) fn reset_gc_limit(&self) {
        let mut limit = (2 * self.node_count()).max(MIN_GC_LIMIT);
        if let Some(node_limit) = self.node_limit.get() {
            limit = limit.min(node_limit);
        }
        self.gc_limit.set(limit);
    }

    /// Set a new hard node limit (`None` or `Some(0)` for unlimited),
    /// returning the old one.
    pub fn node_limit(&self, limit: Option<usize>) -> Option<usize> {
        let limit = limit.filter(|&l| l > 0);
        let old = self.node_limit.replace(limit);
        if let Some(limit) = limit {
            if self.gc_limit.get() > limit {
                self.gc_limit.set(limit);
            }
        }
        old
    }

    /// Whether some operation failed because of the node limit.
    pub fn overflowed(&self) -> bool {
        self.overflow.get()
    }

    pub fn clear_overflow(&self) {
        self.overflow.set(false);
    }

    /// Run a public operation and wrap its result into a handle.
    ///
    /// If the node limit is hit and automatic collection is on, garbage is
    /// collected and the operation retried once. After success, the
    /// collection and dynamic reordering policies are applied; the result
    /// is already referenced at that point, so it survives both.
    pub(crate) fn run_op(&self, op: impl Fn() -> Result<Ref>) -> Result<Function<'_>> {
        let result = match op() {
            Err(e) if e.is_resource_exhausted() && self.gc_enabled.get() => {
                debug!("{}: collecting garbage and retrying", e);
                self.collect_garbage();
                op()
            }
            result => result,
        };
        match result {
            Ok(f) => {
                let f = Function::new(self, f);
                self.post_process();
                Ok(f)
            }
            Err(e) => {
                if e.is_resource_exhausted() {
                    self.overflow.set(true);
                }
                Err(e)
            }
        }
    }

    fn post_process(&self) {
        if self.gc_enabled.get() && self.node_count() > self.gc_limit.get() {
            self.collect_garbage();
            self.reset_gc_limit();
        }
        let technique = self.reorder_technique.get();
        if self.dynamic_reordering.get()
            && technique != ReorderTechnique::None
            && self.node_count() > self.reorder_threshold.get()
        {
            info!("Dynamic reordering at {} nodes", self.node_count());
            if let Err(e) = self.reorder_with(technique) {
                warn!("Dynamic reordering failed: {}", e);
            }
            let threshold = self.reorder_threshold.get().max(2 * self.node_count());
            self.reorder_threshold.set(threshold);
            self.reset_gc_limit();
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::config::BddConfig;
    use crate::error::BddError;

    #[test]
    fn test_ref_counting() {
        let bdd = Bdd::default();
        let x = bdd.new_var_last().unwrap();
        let y = bdd.new_var_last().unwrap();
        let g = x.and(&y).unwrap();
        let f = g.edge();

        assert_eq!(bdd.ref_count(f), 1);
        bdd.ref_inc(f);
        assert_eq!(bdd.ref_count(f), 2);
        bdd.ref_dec(f);
        assert_eq!(bdd.ref_count(f), 1);
        drop(g);
        assert_eq!(bdd.ref_count(f), 0);
        assert_eq!(bdd.ref_count(Ref::ONE), u32::MAX);
    }

    #[test]
    fn test_gc_frees_dead_nodes() {
        let bdd = Bdd::with_config(BddConfig::default().with_gc(false));
        let x = bdd.new_var_last().unwrap();
        let y = bdd.new_var_last().unwrap();
        let z = bdd.new_var_last().unwrap();
        let vars = bdd.node_count();

        let f = x.and(&y).unwrap().or(&z).unwrap();
        assert!(bdd.node_count() > vars);
        let edge = f.edge();
        drop(f);
        assert_eq!(bdd.ref_count(edge), 0);

        let freed = bdd.collect_garbage();
        assert!(freed >= 2);
        assert_eq!(bdd.node_count(), vars);
        bdd.check_invariants();
    }

    #[test]
    fn test_gc_keeps_shared_nodes() {
        let bdd = Bdd::with_config(BddConfig::default().with_gc(false));
        let x = bdd.new_var_last().unwrap();
        let y = bdd.new_var_last().unwrap();
        let z = bdd.new_var_last().unwrap();

        let yz = y.and(&z).unwrap();
        let f = x.or(&yz).unwrap();
        let yz_edge = yz.edge();
        drop(yz);
        bdd.collect_garbage();

        // Still reachable from f.
        assert!(bdd.ref_count(yz_edge) > 0);
        assert_eq!(f.size(), 3);
        bdd.check_invariants();
    }

    #[test]
    fn test_slots_are_reused() {
        let bdd = Bdd::with_config(BddConfig::default().with_gc(false));
        let x = bdd.new_var_last().unwrap();
        let y = bdd.new_var_last().unwrap();

        let f = x.xor(&y).unwrap();
        let capacity = bdd.nodes.borrow().len();
        drop(f);
        bdd.collect_garbage();
        let g = x.xor(&y).unwrap();
        assert_eq!(bdd.nodes.borrow().len(), capacity);
        assert_eq!(g.size(), 2);
        bdd.check_invariants();
    }

    #[test]
    fn test_gc_limit_bookkeeping() {
        let bdd = Bdd::default();
        bdd.set_gc_limit(123);
        assert_eq!(bdd.gc_limit(), 123);
        bdd.reset_gc_limit();
        assert_eq!(bdd.gc_limit(), MIN_GC_LIMIT);

        assert_eq!(bdd.node_limit(Some(50)), None);
        assert_eq!(bdd.gc_limit(), 50);
        assert_eq!(bdd.node_limit(Some(0)), Some(50));
        assert_eq!(bdd.node_limit(None), None);
    }

    #[test]
    fn test_automatic_gc_runs_past_limit() {
        let bdd = Bdd::with_config(BddConfig::default().with_gc_limit(5));
        let vars: Vec<_> = (0..8).map(|_| bdd.new_var_last().unwrap()).collect();
        for pair in vars.windows(2) {
            let _tmp = pair[0].xor(&pair[1]).unwrap();
        }
        assert!(bdd.stats().gc_runs > 0);
        bdd.check_invariants();
    }

    #[test]
    fn test_node_limit_retry_after_gc() {
        let bdd = Bdd::with_config(BddConfig::default().with_node_limit(Some(4)).with_gc_limit(1000));
        let x = bdd.new_var_last().unwrap();
        let y = bdd.new_var_last().unwrap();
        let z = bdd.new_var_last().unwrap();

        // Leaves dead nodes behind.
        drop(x.xor(&y).unwrap());
        // Needs room that only a collection can provide.
        let f = y.xor(&z).unwrap();
        assert_eq!(f.size(), 2);
        assert_eq!(bdd.stats().gc_runs, 1);
        assert!(!bdd.overflowed());
    }

    #[test]
    fn test_node_limit_overflow() {
        let bdd = Bdd::with_config(BddConfig::default().with_node_limit(Some(4)));
        let vars: Vec<_> = (0..4).map(|_| bdd.new_var_last().unwrap()).collect();
        let err = vars[0].xor(&vars[1]).unwrap_err();
        assert_eq!(err, BddError::ResourceExhausted { limit: 4 });
        assert!(bdd.overflowed());
        bdd.clear_overflow();
        assert!(!bdd.overflowed());
        bdd.check_invariants();
    }
}
