//! Identifier newtypes: variables, levels and node slots.
//!
//! A [`Var`] never changes once handed out. A [`Level`] is where that
//! variable currently sits in the order, and moves under reordering. A
//! [`NodeId`] addresses one slot of the node arena; reordering rewrites the
//! slot's content but never moves it.

use std::fmt;

/// Identifier of a variable, assigned sequentially from 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// # Panics
    ///
    /// Panics on `0`, which names the terminal.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable x0 is reserved for the terminal");
        Var(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Position in the current order; `0` is the top.
///
/// The terminal has the pseudo-level [`Level::TERMINAL`], so comparing the
/// levels of two edges tells which one is tested first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    pub const TERMINAL: Level = Level(usize::MAX);

    pub fn new(index: usize) -> Self {
        Level(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// One level further down.
    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    /// One level further up, if any.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Level)
    }

    pub fn is_terminal(self) -> bool {
        self == Level::TERMINAL
    }

    /// Number of adjacent swaps between the two levels.
    pub fn distance(self, other: Level) -> usize {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "L⊥")
        } else {
            write!(f, "L{}", self.0)
        }
    }
}

/// Slot of the node arena.
///
/// Only 31 bits are usable: [`Ref`](crate::reference::Ref) keeps the
/// complement flag in the low bit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Slot 0 holds the terminal.
    pub const TERMINAL: NodeId = NodeId(0);

    /// End of a collision chain or of the free list.
    pub const INVALID: NodeId = NodeId(0x7FFF_FFFF);

    /// Largest allocatable slot.
    pub const MAX: u32 = 0x7FFF_FFFE;

    /// # Panics
    ///
    /// Panics if `id` needs more than 31 bits.
    pub fn new(id: u32) -> Self {
        assert!(id <= Self::MAX, "Node ID {} does not fit into 31 bits", id);
        NodeId(id)
    }

    /// # Safety
    ///
    /// `id` must be below `2^31`.
    pub const unsafe fn from_raw_unchecked(id: u32) -> Self {
        NodeId(id)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId::new(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}
