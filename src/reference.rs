use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::types::NodeId;

/// An edge to a BDD node, potentially complemented.
///
/// Uses a 32-bit representation where the least significant bit indicates
/// complementation and the remaining bits store the node ID. The terminal
/// node has ID 0, so `ONE` is the regular edge to it and `ZERO` its
/// complement.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    /// Constant true.
    pub const ONE: Self = Self::positive(NodeId::TERMINAL);

    /// Constant false.
    pub const ZERO: Self = Self::negative(NodeId::TERMINAL);

    /// Null edge, returned where no function exists.
    pub const INVALID: Self = Self(0xFFFF_FFFF);

    /// Creates a new reference with the given node ID and negation flag.
    pub const fn new(id: NodeId, negated: bool) -> Self {
        Self((id.raw() << 1) | (negated as u32))
    }

    /// Creates a positive (non-negated) reference.
    pub const fn positive(id: NodeId) -> Self {
        Self::new(id, false)
    }

    /// Creates a negative (negated) reference.
    pub const fn negative(id: NodeId) -> Self {
        Self::new(id, true)
    }

    pub fn positive_from(id: impl Into<NodeId>) -> Self {
        Self::new(id.into(), false)
    }

    /// Returns the node ID this reference points to.
    #[inline]
    pub const fn id(self) -> NodeId {
        // SAFETY: shifting a u32 right by one always fits into 31 bits.
        unsafe { NodeId::from_raw_unchecked(self.0 >> 1) }
    }

    /// Returns true if this reference is negated.
    #[inline]
    pub const fn is_negated(self) -> bool {
        (self.0 & 1) != 0
    }

    /// The same edge with the complement bit cleared.
    #[inline]
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Complements the edge when `flag` is set.
    #[inline]
    pub const fn negate_if(self, flag: bool) -> Self {
        Self(self.0 ^ (flag as u32))
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        (self.0 >> 1) == 0
    }

    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }

    /// Returns the raw underlying value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Default for Ref {
    fn default() -> Self {
        Self::INVALID
    }
}

// -Ref
impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_invalid() {
            write!(f, "null")
        } else if *self == Self::ONE {
            write!(f, "1")
        } else if *self == Self::ZERO {
            write!(f, "0")
        } else if self.is_negated() {
            write!(f, "~{}", self.id())
        } else {
            write!(f, "{}", self.id())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_positive_negative() {
        let id = NodeId::new(42);

        let pos = Ref::positive(id);
        assert_eq!(pos.id(), id);
        assert!(!pos.is_negated());

        let neg = Ref::negative(id);
        assert_eq!(neg.id(), id);
        assert!(neg.is_negated());

        assert_eq!(pos.id(), neg.id());
        assert_ne!(pos, neg);
    }

    #[test]
    fn test_ref_negation() {
        let pos = Ref::positive(NodeId::new(5));
        let neg = Ref::negative(NodeId::new(5));

        assert_eq!(-pos, neg);
        assert_eq!(-neg, pos);
        assert_eq!(-(-pos), pos);
        assert_eq!(neg.regular(), pos);
        assert_eq!(pos.negate_if(true), neg);
        assert_eq!(pos.negate_if(false), pos);
    }

    #[test]
    fn test_ref_constants() {
        assert_eq!(-Ref::ONE, Ref::ZERO);
        assert!(Ref::ONE.is_terminal());
        assert!(Ref::ZERO.is_terminal());
        assert!(!Ref::ONE.is_negated());
        assert!(Ref::ZERO.is_negated());
        assert!(!Ref::INVALID.is_terminal());
        assert!(Ref::INVALID.is_invalid());
        assert_eq!(Ref::default(), Ref::INVALID);
    }

    #[test]
    fn test_ref_raw() {
        // Raw encoding: (id << 1) | negated
        let id = NodeId::new(100);
        assert_eq!(Ref::positive(id).raw(), 200);
        assert_eq!(Ref::negative(id).raw(), 201);
    }

    #[test]
    fn test_ref_display() {
        let id = NodeId::new(42);
        assert_eq!(format!("{}", Ref::positive(id)), "@42");
        assert_eq!(format!("{}", Ref::negative(id)), "~@42");
        assert_eq!(format!("{}", Ref::ONE), "1");
        assert_eq!(format!("{}", Ref::ZERO), "0");
        assert_eq!(format!("{}", Ref::INVALID), "null");
    }

    #[test]
    fn test_ref_large_id() {
        let large_id = NodeId::new(NodeId::MAX);
        let pos = Ref::positive(large_id);
        let neg = Ref::negative(large_id);

        assert_eq!(pos.id(), large_id);
        assert_eq!(neg.id(), large_id);
        assert_eq!(-pos, neg);
        assert!(!neg.is_invalid());
    }
}
