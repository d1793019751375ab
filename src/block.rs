//! Variable blocks.
//!
//! Blocks form a tree over the levels. The root spans the whole order and
//! every variable is a leaf. The children of a block partition its range
//! of levels, top to bottom. Reordering exchanges adjacent children of a
//! reorderable block as units, so a block is never split: its variables
//! stay contiguous and keep their relative order unless the block itself
//! is made reorderable.

use log::debug;

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::function::Function;
use crate::types::{Level, Var};

/// Handle on a group of variables created by [`Bdd::new_var_block`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlockId(usize);

impl BlockId {
    /// The block spanning every variable.
    pub const ROOT: BlockId = BlockId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub(crate) first: usize,
    pub(crate) width: usize,
    pub(crate) reorderable: bool,
    pub(crate) children: Vec<BlockId>,
}

impl Block {
    fn leaf(first: usize) -> Self {
        Self {
            first,
            width: 1,
            reorderable: false,
            children: Vec::new(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn last(&self) -> usize {
        self.first + self.width - 1
    }

    fn contains(&self, level: usize) -> bool {
        level >= self.first && level < self.first + self.width
    }
}

#[derive(Debug)]
pub(crate) struct BlockTree {
    blocks: Vec<Block>,
}

impl BlockTree {
    pub(crate) fn new() -> Self {
        let root = Block {
            first: 0,
            width: 0,
            reorderable: true,
            children: Vec::new(),
        };
        Self { blocks: vec![root] }
    }

    pub(crate) fn get(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub(crate) fn children(&self, id: BlockId) -> &[BlockId] {
        &self.blocks[id.0].children
    }

    pub(crate) fn is_known(&self, id: BlockId) -> bool {
        id.0 < self.blocks.len()
    }

    pub(crate) fn set_reorderable(&mut self, id: BlockId, reorderable: bool) {
        self.blocks[id.0].reorderable = reorderable;
    }

    fn shift(&mut self, id: BlockId, delta: isize) {
        let mut stack = vec![id];
        while let Some(b) = stack.pop() {
            let block = &mut self.blocks[b.0];
            block.first = block.first.wrapping_add_signed(delta);
            stack.extend(block.children.iter().copied());
        }
    }

    /// Make room for a new variable at `level`, as a leaf of the innermost
    /// block that has variables both above and below it.
    pub(crate) fn insert_level(&mut self, level: usize) {
        let mut parent = BlockId::ROOT;
        loop {
            self.blocks[parent.0].width += 1;
            let children = self.blocks[parent.0].children.clone();
            let pos = children
                .iter()
                .position(|&c| self.get(c).last() >= level)
                .unwrap_or(children.len());

            match children.get(pos) {
                Some(&c) if self.get(c).first < level => {
                    for &later in &children[pos + 1..] {
                        self.shift(later, 1);
                    }
                    parent = c;
                }
                _ => {
                    for &later in &children[pos..] {
                        self.shift(later, 1);
                    }
                    let leaf = BlockId(self.blocks.len());
                    self.blocks.push(Block::leaf(level));
                    self.blocks[parent.0].children.insert(pos, leaf);
                    return;
                }
            }
        }
    }

    /// Group the levels `first..first + width` into a new block.
    ///
    /// The range must be aligned with the existing blocks: it may contain
    /// whole blocks and sit inside one, but never cut one.
    pub(crate) fn add_block(&mut self, first: usize, width: usize) -> Result<BlockId> {
        let root_width = self.get(BlockId::ROOT).width;
        if width == 0 || first + width > root_width {
            return Err(BddError::invalid_argument(format!(
                "block of {} levels at L{} does not fit in {} levels",
                width, first, root_width
            )));
        }
        let last = first + width - 1;

        let mut parent = BlockId::ROOT;
        loop {
            let children = self.children(parent);
            let (Some(i), Some(j)) = (
                children.iter().position(|&c| self.get(c).contains(first)),
                children.iter().position(|&c| self.get(c).contains(last)),
            ) else {
                return Err(BddError::invalid_argument("block range is not covered"));
            };

            let start = self.get(children[i]);
            if i == j && (start.first != first || start.width != width) {
                parent = children[i];
                continue;
            }
            if start.first != first || self.get(children[j]).last() != last {
                return Err(BddError::invalid_argument(format!(
                    "levels L{}..=L{} overlap an existing block",
                    first, last
                )));
            }

            let id = BlockId(self.blocks.len());
            let grouped: Vec<BlockId> = self.blocks[parent.0].children.drain(i..=j).collect();
            self.blocks.push(Block {
                first,
                width,
                reorderable: false,
                children: grouped,
            });
            self.blocks[parent.0].children.insert(i, id);
            return Ok(id);
        }
    }

    /// Record that children `pos` and `pos + 1` of `parent` traded places.
    pub(crate) fn exchange(&mut self, parent: BlockId, pos: usize) {
        let upper = self.blocks[parent.0].children[pos];
        let lower = self.blocks[parent.0].children[pos + 1];
        let upper_width = self.get(upper).width as isize;
        let lower_width = self.get(lower).width as isize;
        self.shift(upper, lower_width);
        self.shift(lower, -upper_width);
        self.blocks[parent.0].children.swap(pos, pos + 1);
    }

    /// Parent of the leaf at `level` and the leaf's position among its
    /// siblings.
    pub(crate) fn leaf_parent(&self, level: usize) -> Option<(BlockId, usize)> {
        let mut parent = BlockId::ROOT;
        loop {
            let pos = self.children(parent).iter().position(|&c| self.get(c).contains(level))?;
            let child = self.children(parent)[pos];
            if self.get(child).is_leaf() {
                return Some((parent, pos));
            }
            parent = child;
        }
    }

    /// Panics unless every block is partitioned by its children.
    pub(crate) fn check(&self, num_levels: usize) {
        let root = self.get(BlockId::ROOT);
        assert_eq!(root.first, 0, "Root block must start at the top");
        assert_eq!(root.width, num_levels, "Root block must span every level");

        let mut leaves = 0;
        let mut stack = vec![BlockId::ROOT];
        while let Some(id) = stack.pop() {
            let block = self.get(id);
            if id != BlockId::ROOT && block.is_leaf() {
                assert_eq!(block.width, 1, "Leaf block {:?} spans {} levels", id, block.width);
                leaves += 1;
                continue;
            }
            let mut next = block.first;
            for &c in &block.children {
                assert_eq!(self.get(c).first, next, "Gap or overlap inside block {:?}", id);
                next += self.get(c).width;
                stack.push(c);
            }
            assert_eq!(next, block.first + block.width, "Children of {:?} do not fill it", id);
        }
        assert_eq!(leaves, num_levels, "One leaf per variable");
    }
}

impl Bdd {
    /// Group `length` consecutive variables, starting at `first` and going
    /// down the current order, into a block that reordering moves as one
    /// unit.
    ///
    /// Blocks nest: a new block may contain existing blocks or sit inside
    /// one, but must not cut through one. The variables inside a new block
    /// keep their relative order until [`Bdd::var_block_reorderable`]
    /// allows otherwise.
    ///
    /// # Errors
    ///
    /// [`BddError::InvalidArgument`] if `first` is not a positive literal,
    /// if the range is empty or runs past the last level, or if it
    /// partially overlaps an existing block.
    pub fn new_var_block(&self, first: &Function<'_>, length: usize) -> Result<BlockId> {
        let var = self.literal_of(first)?;
        let level = self.level_of_unchecked(var);
        let id = self.blocks.borrow_mut().add_block(level.index(), length)?;
        debug!("New block {:?}: {} variables from {}", id, length, var);
        Ok(id)
    }

    /// Allow or forbid reordering of the children of `block`.
    pub fn var_block_reorderable(&self, block: BlockId, reorderable: bool) -> Result<()> {
        let mut blocks = self.blocks.borrow_mut();
        if !blocks.is_known(block) {
            return Err(BddError::invalid_argument(format!("unknown block {:?}", block)));
        }
        blocks.set_reorderable(block, reorderable);
        Ok(())
    }

    /// Variables of `block`, top to bottom in the current order.
    pub fn var_block_vars(&self, block: BlockId) -> Result<Vec<Var>> {
        let blocks = self.blocks.borrow();
        if !blocks.is_known(block) {
            return Err(BddError::invalid_argument(format!("unknown block {:?}", block)));
        }
        let b = blocks.get(block);
        Ok((b.first..b.first + b.width).map(|l| self.var_at(Level::new(l))).collect())
    }
}
