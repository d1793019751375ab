use crate::reference::Ref;
use crate::types::NodeId;

/// A slot of the node arena.
///
/// Live slots hold a decision node `(variable, low, high)`. The `high`
/// edge of a stored node is never complemented. `next` links the slot into
/// the collision chain of its level's subtable; free slots reuse it to
/// link the free list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub variable: u32,
    pub low: Ref,
    pub high: Ref,
    pub next: NodeId,
    pub rc: u32,
}

impl Node {
    /// End-of-chain marker.
    pub const NO_NEXT: NodeId = NodeId::INVALID;

    /// Reference count that is never decremented again.
    pub const RC_PINNED: u32 = u32::MAX;

    pub fn new(variable: u32, low: Ref, high: Ref) -> Self {
        Self {
            variable,
            low,
            high,
            next: Self::NO_NEXT,
            rc: 0,
        }
    }

    /// The terminal slot: variable 0, pinned.
    pub fn terminal() -> Self {
        Self {
            variable: 0,
            low: Ref::ONE,
            high: Ref::ONE,
            next: Self::NO_NEXT,
            rc: Self::RC_PINNED,
        }
    }

    /// Whether the slot is on the free list.
    pub fn is_free(&self) -> bool {
        self.variable == 0 && self.low.is_invalid()
    }

    pub fn is_dead(&self) -> bool {
        self.rc == 0
    }

    pub(crate) fn mark_free(&mut self, next_free: NodeId) {
        self.variable = 0;
        self.low = Ref::INVALID;
        self.high = Ref::INVALID;
        self.next = next_free;
        self.rc = 0;
    }

    /// Increments the count; returns true on the 0 -> 1 transition.
    #[inline]
    pub(crate) fn inc_rc(&mut self) -> bool {
        if self.rc == Self::RC_PINNED {
            return false;
        }
        self.rc += 1;
        self.rc == 1
    }

    /// Decrements the count; returns true on the 1 -> 0 transition.
    #[inline]
    pub(crate) fn dec_rc(&mut self) -> bool {
        if self.rc == Self::RC_PINNED {
            return false;
        }
        assert!(self.rc > 0, "Reference count underflow on a dead node");
        self.rc -= 1;
        self.rc == 0
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0, Ref::INVALID, Ref::INVALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc_transitions() {
        let mut node = Node::new(1, Ref::ZERO, Ref::ONE);
        assert!(node.is_dead());
        assert!(node.inc_rc());
        assert!(!node.inc_rc());
        assert!(!node.dec_rc());
        assert!(node.dec_rc());
        assert!(node.is_dead());
    }

    #[test]
    fn test_pinned_rc_is_sticky() {
        let mut node = Node::terminal();
        assert!(!node.inc_rc());
        assert!(!node.dec_rc());
        assert_eq!(node.rc, Node::RC_PINNED);
    }

    #[test]
    fn test_free_slot() {
        let mut node = Node::new(3, Ref::ZERO, Ref::ONE);
        assert!(!node.is_free());
        node.mark_free(NodeId::new(7));
        assert!(node.is_free());
        assert_eq!(node.next, NodeId::new(7));
        assert!(!Node::terminal().is_free());
    }
}
