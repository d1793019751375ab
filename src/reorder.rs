//! Dynamic variable reordering.
//!
//! # Theory: Variable Ordering
//!
//! The size of a BDD is highly sensitive to the variable order. For
//! `f = (x₁ ∧ y₁) ∨ (x₂ ∧ y₂) ∨ ... ∨ (xₙ ∧ yₙ)` the order
//! `x₁, y₁, x₂, y₂, ...` gives O(n) nodes, while `x₁, ..., xₙ, y₁, ..., yₙ`
//! gives O(2ⁿ). Finding an optimal order is NP-complete, so heuristics
//! improve it by local transformations.
//!
//! # The Adjacent Swap
//!
//! Every technique is built from [`Bdd::swap_adjacent`], which exchanges the
//! variables `x` (at level `i`) and `y` (at level `i + 1`) in place:
//!
//! - an `x`-node with no `y`-child does not depend on the order of `x` and
//!   `y` and stays as it is (it simply ends up one level lower);
//! - an `x`-node `f = x ? f₁ : f₀` with a `y`-child is rewritten into the
//!   `y`-node `y ? (x ? f₁₁ : f₀₁) : (x ? f₁₀ : f₀₀)`, interning the two
//!   new `x`-children.
//!
//! The rewritten node keeps its slot, so every edge pointing to it, and
//! hence every handle, still denotes the same function. Old children that
//! lose their last parent are freed on the spot. Freed slots may be
//! reused, so the operation cache is cleared once the reordering (or a
//! standalone swap) is over.
//!
//! # Variable Blocks
//!
//! Techniques work on the children of each reorderable [block](crate::block),
//! starting at the root. Two adjacent children are exchanged by bubbling
//! every variable of the lower one up past the upper one, which keeps both
//! contiguous and in their internal order. Without user blocks every child
//! of the root is a single variable.
//!
//! # Rudell's Sifting
//!
//! Each child (densest first) is moved one position at a time
//! towards the top and then towards the bottom, recording the total node
//! count at every position. A direction is abandoned once the count grows
//! past `max_growth` times the best count seen. The child is then moved
//! back to its best position; among equal counts the one closest to the
//! starting position wins.
//!
//! # Window Permutation
//!
//! A window of `k` adjacent children (2 ≤ k ≤ 4) slides from the top to the
//! bottom. Inside the window all `k!` permutations are visited by single
//! adjacent transpositions (Steinhaus-Johnson-Trotter order) and the first
//! smallest one is restored. Passes over the whole order repeat while they
//! reduce the node count.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//!
//! - M. Fujita, Y. Matsunaga, T. Kakuda. "On variable ordering of binary
//!   decision diagrams for the application of multi-level logic synthesis."
//!   EDAC 1991.

use log::{debug, info};

use crate::bdd::Bdd;
use crate::block::BlockId;
use crate::config::ReorderTechnique;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::{Level, NodeId, Var};

/// Statistics collected during reordering.
#[derive(Debug, Clone, Default)]
pub struct ReorderStats {
    /// Number of variable swaps performed
    pub swaps: usize,
    /// Node count before reordering (after the initial collection)
    pub initial_size: usize,
    /// Node count after reordering
    pub final_size: usize,
    /// Smallest node count seen during reordering
    pub best_size: usize,
    /// Number of variables sifted, or windows permuted
    pub variables_processed: usize,
}

impl ReorderStats {
    /// Calculate the size reduction ratio.
    pub fn reduction_ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }

    /// Calculate the percentage reduction.
    pub fn reduction_percent(&self) -> f64 {
        self.reduction_ratio() * 100.0
    }
}

/// Adjacent transpositions visiting all permutations of `k` elements.
///
/// Entry `t` is the position `p` such that step `t` exchanges positions
/// `p` and `p + 1`. There are `k! - 1` steps.
pub(crate) fn sjt_transpositions(k: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..k).collect();
    // Direction of each element (by value): true = left.
    let mut left = vec![true; k];
    let mut steps = Vec::new();

    loop {
        // Find the largest mobile element
        let mut mobile: Option<usize> = None;
        for pos in 0..k {
            let v = perm[pos];
            let target = if left[v] { pos.checked_sub(1) } else { Some(pos + 1).filter(|&t| t < k) };
            if let Some(t) = target {
                if perm[t] < v && mobile.map_or(true, |m| perm[m] < v) {
                    mobile = Some(pos);
                }
            }
        }
        let Some(pos) = mobile else {
            break;
        };

        let v = perm[pos];
        let target = if left[v] { pos - 1 } else { pos + 1 };
        perm.swap(pos, target);
        steps.push(pos.min(target));
        for w in (v + 1)..k {
            left[w] = !left[w];
        }
    }

    steps
}

impl Bdd {
    /// Cofactors of `f` by the variable `var`, assuming `var` can only be
    /// the top variable of `f`.
    fn split_by(&self, f: Ref, var: u32) -> (Ref, Ref) {
        if f.is_terminal() {
            return (f, f);
        }
        let node = self.node(f.id());
        if node.variable != var {
            return (f, f);
        }
        let n = f.is_negated();
        (node.low.negate_if(n), node.high.negate_if(n))
    }

    fn inc_edge(&self, f: Ref) {
        if !f.is_terminal() {
            self.nodes.borrow_mut()[f.id().index()].inc_rc();
        }
    }

    /// Exchange the variables at `level` and `level + 1`.
    ///
    /// Node ids are preserved, so all handles keep denoting the same
    /// functions. The node limit is not enforced during a swap.
    ///
    /// # Errors
    ///
    /// [`BddError::InvalidArgument`] if there is no level below `level`, or
    /// if the two variables are not adjacent members of one reorderable
    /// block (the swap would split a block).
    pub fn swap_adjacent(&self, level: Level) -> Result<()> {
        if level.index() + 1 >= self.num_vars() {
            return Err(BddError::invalid_argument(format!("no level below {}", level)));
        }
        let (parent, pos) = {
            let blocks = self.blocks.borrow();
            match (blocks.leaf_parent(level.index()), blocks.leaf_parent(level.index() + 1)) {
                (Some((upper, pos)), Some((lower, _))) if upper == lower && blocks.get(upper).reorderable => {
                    (upper, pos)
                }
                _ => {
                    return Err(BddError::invalid_argument(format!(
                        "{} and {} are not swappable within one variable block",
                        level,
                        level.next()
                    )))
                }
            }
        };

        self.swap_levels(level)?;
        self.blocks.borrow_mut().exchange(parent, pos);
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// The in-place swap itself. Block bookkeeping and the operation cache
    /// are left to the caller.
    fn swap_levels(&self, level: Level) -> Result<()> {
        let x = self.var_at(level);
        let y = self.var_at(level.next());
        debug!("Swapping {} at {} with {} at {}", x, level, y, level.next());

        let is_y = |f: Ref| !f.is_terminal() && self.variable(f.id()) == y.id();
        let moving: Vec<NodeId> = self
            .level_ids(level)
            .into_iter()
            .filter(|&id| {
                let node = self.node(id);
                is_y(node.low) || is_y(node.high)
            })
            .collect();

        for &id in &moving {
            self.unlink_node(id);
        }
        self.swap_level_metadata(level);

        let mut dead = Vec::new();
        for id in moving {
            let node = self.node(id);
            let (f00, f01) = self.split_by(node.low, y.id());
            let (f10, f11) = self.split_by(node.high, y.id());

            let low = self.intern(x.id(), f00, f10, false)?;
            let high = self.intern(x.id(), f01, f11, false)?;
            debug_assert!(!high.is_negated());
            debug_assert_ne!(low, high);

            self.inc_edge(low);
            self.inc_edge(high);
            self.rewrite_node(id, y.id(), low, high);

            let mut nodes = self.nodes.borrow_mut();
            for old in [node.low, node.high] {
                if !old.is_terminal() && nodes[old.id().index()].dec_rc() {
                    dead.push(old.id());
                }
            }
        }
        self.free_dead(dead);

        self.swaps.set(self.swaps.get() + 1);
        Ok(())
    }

    /// Move child `pos + 1` of `parent` above child `pos`. Both keep their
    /// internal order.
    fn exchange_blocks(&self, parent: BlockId, pos: usize) -> Result<()> {
        let (first, upper_width, lower_width) = {
            let blocks = self.blocks.borrow();
            let children = blocks.children(parent);
            let upper = blocks.get(children[pos]);
            let lower = blocks.get(children[pos + 1]);
            (upper.first, upper.width, lower.width)
        };

        // Bubble each variable of the lower block up past the upper block.
        for k in 0..lower_width {
            for level in ((first + k)..(first + upper_width + k)).rev() {
                self.swap_levels(Level::new(level))?;
            }
        }
        self.blocks.borrow_mut().exchange(parent, pos);
        Ok(())
    }

    /// Average number of nodes per level of a block.
    fn block_density(&self, block: BlockId) -> usize {
        let (first, width) = {
            let blocks = self.blocks.borrow();
            let b = blocks.get(block);
            (b.first, b.width)
        };
        let sizes = self.level_sizes();
        sizes[first..first + width].iter().sum::<usize>() / width
    }

    /// Sift child `start` of `parent` to its best position among its
    /// siblings.
    fn sift_block(&self, parent: BlockId, start: usize) -> Result<()> {
        let num_children = self.blocks.borrow().children(parent).len();
        let max_growth = self.config().max_growth;
        let swap_budget = self.swaps.get().saturating_add(self.config().max_swaps);

        let mut best_size = self.node_count();
        let mut best_pos = start;
        let mut current = start;

        let mut record = |pos: usize, size: usize| {
            if size < best_size || (size == best_size && pos.abs_diff(start) < best_pos.abs_diff(start)) {
                best_size = size;
                best_pos = pos;
            }
            (size as f64) <= max_growth * best_size as f64
        };

        // Up
        while current > 0 {
            if self.swaps.get() >= swap_budget {
                break;
            }
            self.exchange_blocks(parent, current - 1)?;
            current -= 1;
            if !record(current, self.node_count()) {
                break;
            }
        }

        // Down
        while current + 1 < num_children {
            if self.swaps.get() >= swap_budget {
                break;
            }
            self.exchange_blocks(parent, current)?;
            current += 1;
            if current > start && !record(current, self.node_count()) {
                break;
            }
        }

        debug!("  Best position: {} of {} with {} nodes", best_pos, num_children, best_size);
        while current > best_pos {
            self.exchange_blocks(parent, current - 1)?;
            current -= 1;
        }
        while current < best_pos {
            self.exchange_blocks(parent, current)?;
            current += 1;
        }
        Ok(())
    }

    /// Sift one variable to its best level.
    ///
    /// The variable moves among the siblings of its block; inside a block
    /// that is not reorderable it stays where it is. Returns the node count
    /// at the chosen level.
    pub fn sift_variable(&self, var: Var) -> Result<usize> {
        self.check_var(var)?;
        let start = self.level_of_unchecked(var);
        let leaf = {
            let blocks = self.blocks.borrow();
            blocks
                .leaf_parent(start.index())
                .filter(|&(parent, _)| blocks.get(parent).reorderable)
        };
        if let Some((parent, pos)) = leaf {
            debug!("Sifting {} (initially at {}, {} nodes)", var, start, self.node_count());
            let result = self.sift_block(parent, pos);
            self.cache.borrow_mut().clear();
            result?;
        }
        Ok(self.node_count())
    }

    /// Sift the children of `parent`, heaviest first, then recurse into
    /// every child block.
    fn sift_children(&self, parent: BlockId, processed: &mut usize, start_swaps: usize) -> Result<()> {
        let (reorderable, children) = {
            let blocks = self.blocks.borrow();
            (blocks.get(parent).reorderable, blocks.children(parent).to_vec())
        };

        if reorderable && children.len() > 1 {
            let mut order: Vec<(BlockId, usize)> = children.iter().map(|&c| (c, self.block_density(c))).collect();
            order.sort_by(|a, b| b.1.cmp(&a.1));

            for (child, _) in order {
                if *processed >= self.config().max_vars_sifted {
                    break;
                }
                if self.swaps.get() - start_swaps >= self.config().max_swaps {
                    debug!("Swap limit reached after {} blocks", processed);
                    break;
                }
                let pos = self.blocks.borrow().children(parent).iter().position(|&c| c == child);
                if let Some(pos) = pos {
                    self.sift_block(parent, pos)?;
                    *processed += 1;
                }
            }
        }

        let children = self.blocks.borrow().children(parent).to_vec();
        for child in children {
            if !self.blocks.borrow().get(child).is_leaf() {
                self.sift_children(child, processed, start_swaps)?;
            }
        }
        Ok(())
    }

    fn sift(&self) -> Result<usize> {
        let mut processed = 0;
        self.sift_children(BlockId::ROOT, &mut processed, self.swaps.get())?;
        Ok(processed)
    }

    /// Permute the `k` children of `parent` starting at `start`, keeping the
    /// best order.
    fn permute_window(&self, parent: BlockId, start: usize, steps: &[usize]) -> Result<()> {
        let mut sizes = Vec::with_capacity(steps.len() + 1);
        sizes.push(self.node_count());
        for &p in steps {
            self.exchange_blocks(parent, start + p)?;
            sizes.push(self.node_count());
        }

        // First smallest
        let mut best = 0;
        for (i, &size) in sizes.iter().enumerate() {
            if size < sizes[best] {
                best = i;
            }
        }

        for &p in steps[best..].iter().rev() {
            self.exchange_blocks(parent, start + p)?;
        }
        Ok(())
    }

    /// Window permutation over the children of `parent`, then inside every
    /// child block.
    fn window_children(&self, parent: BlockId) -> Result<usize> {
        let (reorderable, num_children) = {
            let blocks = self.blocks.borrow();
            (blocks.get(parent).reorderable, blocks.children(parent).len())
        };

        let mut windows = 0;
        let k = self.config().window_size.min(num_children);
        if reorderable && k >= 2 {
            let steps = sjt_transpositions(k);
            loop {
                let before = self.node_count();
                for start in 0..=(num_children - k) {
                    self.permute_window(parent, start, &steps)?;
                    windows += 1;
                }
                let after = self.node_count();
                debug!("Window pass: {} -> {} nodes", before, after);
                if after >= before {
                    break;
                }
            }
        }

        let children = self.blocks.borrow().children(parent).to_vec();
        for child in children {
            if !self.blocks.borrow().get(child).is_leaf() {
                windows += self.window_children(child)?;
            }
        }
        Ok(windows)
    }

    fn window(&self) -> Result<usize> {
        self.window_children(BlockId::ROOT)
    }

    /// Reorder with the configured technique.
    pub fn reorder(&self) -> Result<ReorderStats> {
        self.reorder_with(self.reorder_technique.get())
    }

    /// Collect garbage, then reorder with `technique`.
    pub fn reorder_with(&self, technique: ReorderTechnique) -> Result<ReorderStats> {
        if technique == ReorderTechnique::None || self.num_vars() < 2 {
            let size = self.node_count();
            return Ok(ReorderStats {
                initial_size: size,
                final_size: size,
                best_size: size,
                ..Default::default()
            });
        }

        self.collect_garbage();
        let initial_size = self.node_count();
        let start_swaps = self.swaps.get();

        let processed = match technique {
            ReorderTechnique::Sift => self.sift(),
            ReorderTechnique::Window => self.window(),
            ReorderTechnique::None => Ok(0),
        };
        self.cache.borrow_mut().clear();
        let processed = processed?;

        let final_size = self.node_count();
        let swaps = self.swaps.get() - start_swaps;
        self.reorderings.set(self.reorderings.get() + 1);
        info!(
            "Reordering ({:?}): {} -> {} nodes, {} swaps",
            technique, initial_size, final_size, swaps
        );

        Ok(ReorderStats {
            swaps,
            initial_size,
            final_size,
            best_size: final_size.min(initial_size),
            variables_processed: processed,
        })
    }

    pub fn set_reorder_technique(&self, technique: ReorderTechnique) {
        self.reorder_technique.set(technique);
    }

    pub fn reorder_technique(&self) -> ReorderTechnique {
        self.reorder_technique.get()
    }

    /// Enable automatic reordering with `technique`; `None` disables it.
    pub fn dynamic_reordering(&self, technique: ReorderTechnique) {
        debug!("Dynamic reordering: {:?}", technique);
        self.reorder_technique.set(technique);
        self.dynamic_reordering.set(technique != ReorderTechnique::None);
    }

    pub fn is_dynamic_reordering(&self) -> bool {
        self.dynamic_reordering.get()
    }

    /// Node count above which automatic reordering runs.
    pub fn set_reorder_threshold(&self, threshold: usize) {
        self.reorder_threshold.set(threshold);
    }

    pub fn reorder_threshold(&self) -> usize {
        self.reorder_threshold.get()
    }
}
