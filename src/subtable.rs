//! Per-level unique subtables with intrusive collision chains.
//!
//! The manager keeps every node in one arena (`Vec<Node>`) and one
//! [`Subtable`] per level of the variable order:
//!
//! ```text
//! subtables[0] → Subtable for the variable at level 0
//! subtables[1] → Subtable for the variable at level 1
//! ...
//! ```
//!
//! A subtable is just an array of bucket heads. Collision chains are linked
//! through `Node::next`, so the nodes themselves form the lists:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ buckets: [NodeId; 2^bits]                       │
//! │   [0] ─────► Node@5 ──► Node@12 ──► ∅           │
//! │   [1] ─────► ∅                                  │
//! │   [2] ─────► Node@3 ──► ∅                       │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The variable is implicit in the subtable, so only `(low, high)` is
//! hashed. A subtable belongs to a variable, not to a level: reordering
//! moves whole subtables between levels and only rewrites the nodes whose
//! children change.

use crate::node::Node;
use crate::reference::Ref;
use crate::types::{NodeId, Var};
use crate::utils::pairing2;

/// Average chain length that triggers doubling of the bucket array.
const MAX_CHAIN_LENGTH: usize = 4;

/// A subtable storing the nodes of a single variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    /// The variable of all nodes in this subtable.
    pub variable: Var,

    /// Bucket heads; [`Node::NO_NEXT`] marks an empty bucket.
    buckets: Vec<NodeId>,

    /// `bucket_index = hash & bitmask`.
    bitmask: u64,

    count: usize,
}

impl Subtable {
    /// Creates an empty subtable with `2^bits` buckets.
    pub fn with_bucket_bits(variable: Var, bits: usize) -> Self {
        assert!(bits <= 31, "Bucket bits must be in range 0..=31, got {}", bits);
        let num_buckets = 1usize << bits;
        Self {
            variable,
            buckets: vec![Node::NO_NEXT; num_buckets],
            bitmask: (num_buckets - 1) as u64,
            count: 0,
        }
    }

    #[inline]
    fn bucket_index(&self, low: Ref, high: Ref) -> usize {
        (hash_children(low, high) & self.bitmask) as usize
    }

    /// Looks up the node with the given children.
    pub fn find(&self, low: Ref, high: Ref, nodes: &[Node]) -> Option<NodeId> {
        let mut current = self.buckets[self.bucket_index(low, high)];
        while current != Node::NO_NEXT {
            let node = &nodes[current.index()];
            if node.low == low && node.high == high {
                return Some(current);
            }
            current = node.next;
        }
        None
    }

    /// Prepends `id` to its collision chain. The slot's children must
    /// already be set. Doubles the bucket array first when chains grow too
    /// long.
    pub fn insert(&mut self, id: NodeId, nodes: &mut [Node]) {
        if self.count >= self.buckets.len() * MAX_CHAIN_LENGTH {
            self.resize(nodes);
        }
        self.link(id, nodes);
    }

    fn link(&mut self, id: NodeId, nodes: &mut [Node]) {
        let node = &nodes[id.index()];
        let bucket = self.bucket_index(node.low, node.high);
        nodes[id.index()].next = self.buckets[bucket];
        self.buckets[bucket] = id;
        self.count += 1;
    }

    /// Unlinks `id` from its chain. The slot's children must still be the
    /// ones it was inserted with.
    ///
    /// Returns true if the node was found and removed.
    pub fn remove(&mut self, id: NodeId, nodes: &mut [Node]) -> bool {
        let node = &nodes[id.index()];
        let bucket = self.bucket_index(node.low, node.high);
        let mut prev = Node::NO_NEXT;
        let mut current = self.buckets[bucket];

        while current != Node::NO_NEXT {
            let next = nodes[current.index()].next;
            if current == id {
                if prev == Node::NO_NEXT {
                    self.buckets[bucket] = next;
                } else {
                    nodes[prev.index()].next = next;
                }
                nodes[id.index()].next = Node::NO_NEXT;
                self.count -= 1;
                return true;
            }
            prev = current;
            current = next;
        }

        false
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Collects all node ids in this subtable.
    pub fn ids(&self, nodes: &[Node]) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.count);
        for &head in &self.buckets {
            let mut current = head;
            while current != Node::NO_NEXT {
                ids.push(current);
                current = nodes[current.index()].next;
            }
        }
        ids
    }

    /// Doubles the bucket count and relinks every node.
    pub fn resize(&mut self, nodes: &mut [Node]) {
        log::debug!(
            "Resizing subtable for {}: {} -> {} buckets",
            self.variable,
            self.buckets.len(),
            self.buckets.len() * 2
        );

        let ids = self.ids(nodes);
        let num_buckets = self.buckets.len() * 2;
        self.buckets = vec![Node::NO_NEXT; num_buckets];
        self.bitmask = (num_buckets - 1) as u64;
        self.count = 0;
        for id in ids {
            self.link(id, nodes);
        }
    }
}

#[inline]
fn hash_children(low: Ref, high: Ref) -> u64 {
    pairing2(low.raw() as u64, high.raw() as u64)
}
