//! Error types for the BDD manager.
//!
//! Two families of failures are reported to the caller: invalid arguments
//! (foreign handles, unknown variables, malformed associations) and
//! resource exhaustion (the node limit was hit and collection could not
//! make room). Broken internal invariants are bugs and panic instead.

use std::fmt;

/// The error type of all fallible manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BddError {
    /// Operands belong to different managers.
    ForeignManager,

    /// No variable with this identifier exists.
    UnknownVariable {
        /// The offending identifier
        id: u32,
    },

    /// No association with this identifier is registered.
    UnknownAssociation {
        /// The offending identifier
        id: usize,
    },

    /// An association table cannot be built from the given pairs.
    InvalidAssociation {
        /// What was wrong with the pairs
        reason: String,
    },

    /// Any other argument the operation cannot accept.
    InvalidArgument {
        /// Description of what was invalid
        reason: String,
    },

    /// Node creation was blocked by the configured node limit.
    ResourceExhausted {
        /// The node limit in effect
        limit: usize,
    },
}

impl BddError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        BddError::InvalidArgument { reason: reason.into() }
    }

    pub(crate) fn invalid_association(reason: impl Into<String>) -> Self {
        BddError::InvalidAssociation { reason: reason.into() }
    }

    /// Whether this is a resource-exhaustion condition.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, BddError::ResourceExhausted { .. })
    }
}

impl fmt::Display for BddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BddError::ForeignManager => write!(f, "Operands belong to different BDD managers"),
            BddError::UnknownVariable { id } => write!(f, "Unknown variable x{}", id),
            BddError::UnknownAssociation { id } => write!(f, "Unknown association #{}", id),
            BddError::InvalidAssociation { reason } => write!(f, "Invalid association: {}", reason),
            BddError::InvalidArgument { reason } => write!(f, "Invalid argument: {}", reason),
            BddError::ResourceExhausted { limit } => {
                write!(f, "Node limit of {} nodes exceeded", limit)
            }
        }
    }
}

impl std::error::Error for BddError {}

/// Convenient result alias for manager operations.
pub type Result<T> = std::result::Result<T, BddError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(BddError::UnknownVariable { id: 7 }.to_string(), "Unknown variable x7");
        assert_eq!(
            BddError::ResourceExhausted { limit: 100 }.to_string(),
            "Node limit of 100 nodes exceeded"
        );
        assert_eq!(
            BddError::invalid_association("x1 appears twice").to_string(),
            "Invalid association: x1 appears twice"
        );
    }

    #[test]
    fn test_kinds() {
        assert!(BddError::ResourceExhausted { limit: 1 }.is_resource_exhausted());
        assert!(!BddError::ForeignManager.is_resource_exhausted());
        let err: Box<dyn std::error::Error> = Box::new(BddError::invalid_argument("zero"));
        assert_eq!(err.to_string(), "Invalid argument: zero");
    }
}
