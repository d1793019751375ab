//! Operation cache (computed table).
//!
//! A direct-mapped table of `2^bits` slots. Each key hashes to exactly one
//! slot and a collision simply overwrites the previous entry, so the cache
//! never grows. Correctness never depends on residency: a miss only costs a
//! recomputation.
//!
//! Entries refer to nodes by id, so the cache must be cleared whenever ids
//! can change meaning: after garbage collection (slots get reused) and
//! after reordering (slots get rewritten in place).

use crate::reference::Ref;
use crate::utils::{pairing3, pairing4, BucketHash};

/// Cache key: operation tag plus normalized operands.
///
/// Association-driven operations carry the association stamp, which
/// changes whenever the association content changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpKey {
    Ite(Ref, Ref, Ref),
    And(Ref, Ref),
    Xor(Ref, Ref),
    Constrain(Ref, Ref),
    Restrict(Ref, Ref),
    Exists(Ref, u32),
    RelProd(Ref, Ref, u32),
    Substitute(Ref, u32),
    VarSubstitute(Ref, u32),
}

impl OpKey {
    fn tag(&self) -> u64 {
        match self {
            OpKey::Ite(..) => 1,
            OpKey::And(..) => 2,
            OpKey::Xor(..) => 3,
            OpKey::Constrain(..) => 4,
            OpKey::Restrict(..) => 5,
            OpKey::Exists(..) => 6,
            OpKey::RelProd(..) => 7,
            OpKey::Substitute(..) => 8,
            OpKey::VarSubstitute(..) => 9,
        }
    }
}

impl BucketHash for OpKey {
    fn hash(&self) -> u64 {
        let tag = self.tag();
        match *self {
            OpKey::Ite(f, g, h) => pairing4(tag, f.raw() as u64, g.raw() as u64, h.raw() as u64),
            OpKey::And(f, g) | OpKey::Xor(f, g) | OpKey::Constrain(f, g) | OpKey::Restrict(f, g) => {
                pairing3(tag, f.raw() as u64, g.raw() as u64)
            }
            OpKey::Exists(f, a) | OpKey::Substitute(f, a) | OpKey::VarSubstitute(f, a) => {
                pairing3(tag, f.raw() as u64, a as u64)
            }
            OpKey::RelProd(f, g, a) => pairing4(tag, f.raw() as u64, g.raw() as u64, a as u64),
        }
    }
}

/// A direct-mapped cache.
pub struct Cache<K, V> {
    entries: Vec<Option<(K, V)>>,
    bitmask: u64,
    hits: usize,
    misses: usize,
    faults: usize,
    clears: usize,
}

impl<K, V> Cache<K, V> {
    /// Creates a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);

        let size = 1usize << bits;
        Self {
            entries: (0..size).map(|_| None).collect(),
            bitmask: (size - 1) as u64,
            hits: 0,
            misses: 0,
            faults: 0,
            clears: 0,
        }
    }

    /// Returns the number of slots in the cache.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Returns the number of misses caused by a different key in the slot.
    pub fn faults(&self) -> usize {
        self.faults
    }

    /// Number of times the cache was cleared.
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
        self.clears += 1;
    }
}

impl<K, V> Cache<K, V>
where
    K: BucketHash + Eq,
    V: Copy,
{
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    /// Looks up a key in the cache.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<V> {
        let idx = self.index(key);
        match &self.entries[idx] {
            Some((k, v)) if k == key => {
                self.hits += 1;
                Some(*v)
            }
            Some(_) => {
                self.faults += 1;
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts a key-value pair, overwriting whatever occupies the slot.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Some((key, value));
    }
}

/// The manager's shared operation cache.
pub type OpCache = Cache<OpKey, Ref>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    fn r(i: u32) -> Ref {
        Ref::positive(NodeId::new(i))
    }

    #[test]
    fn test_cache_insert_get() {
        let mut cache = OpCache::new(8);

        cache.insert(OpKey::And(r(1), r(2)), r(3));
        cache.insert(OpKey::Xor(r(1), r(2)), r(4));

        assert_eq!(cache.get(&OpKey::And(r(1), r(2))), Some(r(3)));
        assert_eq!(cache.get(&OpKey::Xor(r(1), r(2))), Some(r(4)));
        assert_eq!(cache.get(&OpKey::And(r(2), r(1))), None);
        assert_eq!(cache.get(&OpKey::Exists(r(1), 2)), None);
    }

    #[test]
    fn test_tags_keep_operations_apart() {
        let a = OpKey::Constrain(r(5), r(6));
        let b = OpKey::Restrict(r(5), r(6));
        assert_ne!(a, b);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = OpCache::new(4);
        cache.insert(OpKey::Ite(r(1), r(2), r(3)), r(9));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.clears(), 1);
        assert_eq!(cache.get(&OpKey::Ite(r(1), r(2), r(3))), None);
    }

    #[test]
    fn test_cache_is_bounded() {
        // 4 slots, so at most 4 of the 16 entries survive.
        let mut cache = OpCache::new(2);
        for i in 0..16 {
            cache.insert(OpKey::Substitute(r(i), 1), r(i));
        }
        assert!(cache.len() <= 4);
        let found = (0..16).filter(|&i| cache.get(&OpKey::Substitute(r(i), 1)).is_some()).count();
        assert!(found <= 4);
    }

    #[test]
    fn test_cache_statistics() {
        let mut cache = OpCache::new(4);
        cache.get(&OpKey::And(r(1), r(2)));
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);

        cache.insert(OpKey::And(r(1), r(2)), r(7));
        cache.get(&OpKey::And(r(1), r(2)));
        assert_eq!(cache.hits(), 1);
    }
}
