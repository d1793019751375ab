//! Manager configuration.
//!
//! ```
//! use cal_bdd::bdd::Bdd;
//! use cal_bdd::config::{BddConfig, ReorderTechnique};
//!
//! let config = BddConfig::default()
//!     .with_cache_bits(12)
//!     .with_node_limit(Some(1_000_000))
//!     .with_reorder_technique(ReorderTechnique::Window)
//!     .with_dynamic_reordering(true);
//! let bdd = Bdd::with_config(config);
//! assert_eq!(bdd.config().cache_bits, 12);
//! ```

/// Smallest automatic collection threshold.
pub const MIN_GC_LIMIT: usize = 10_000;

/// Variable reordering heuristic.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ReorderTechnique {
    /// Reordering requests are ignored.
    None,
    /// Rudell's sifting.
    #[default]
    Sift,
    /// Exhaustive permutation of a sliding window of adjacent levels.
    Window,
}

/// Tunables of a [`Bdd`](crate::bdd::Bdd) manager.
#[derive(Debug, Clone, PartialEq)]
pub struct BddConfig {
    /// The operation cache has `2^cache_bits` slots.
    pub cache_bits: usize,
    /// Initial bucket count of each level's subtable, as a power of two.
    pub subtable_bits: usize,
    /// Hard limit on the number of non-terminal nodes (`None` = unlimited).
    pub node_limit: Option<usize>,
    /// Automatic garbage collection between operations.
    pub gc_enabled: bool,
    /// Node count above which automatic collection runs.
    pub gc_limit: usize,
    pub reorder_technique: ReorderTechnique,
    /// Reorder automatically once the node count passes `reorder_threshold`.
    pub dynamic_reordering: bool,
    pub reorder_threshold: usize,
    /// Sifting abandons a direction once the size exceeds `max_growth`
    /// times the best size seen for the current variable.
    pub max_growth: f64,
    pub max_vars_sifted: usize,
    pub max_swaps: usize,
    /// Number of adjacent levels permuted by the window technique (2..=4).
    pub window_size: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            cache_bits: 16,
            subtable_bits: 8,
            node_limit: None,
            gc_enabled: true,
            gc_limit: MIN_GC_LIMIT,
            reorder_technique: ReorderTechnique::Sift,
            dynamic_reordering: false,
            reorder_threshold: 10_000,
            max_growth: 2.0,
            max_vars_sifted: 1000,
            max_swaps: 2_000_000,
            window_size: 3,
        }
    }
}

impl BddConfig {
    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);
        self.cache_bits = bits;
        self
    }

    pub fn with_subtable_bits(mut self, bits: usize) -> Self {
        assert!(bits <= 31, "Subtable bits must be in range 0..=31, got {}", bits);
        self.subtable_bits = bits;
        self
    }

    pub fn with_node_limit(mut self, limit: Option<usize>) -> Self {
        self.node_limit = limit;
        self
    }

    pub fn with_gc(mut self, enabled: bool) -> Self {
        self.gc_enabled = enabled;
        self
    }

    pub fn with_gc_limit(mut self, limit: usize) -> Self {
        self.gc_limit = limit;
        self
    }

    pub fn with_reorder_technique(mut self, technique: ReorderTechnique) -> Self {
        self.reorder_technique = technique;
        self
    }

    pub fn with_dynamic_reordering(mut self, enabled: bool) -> Self {
        self.dynamic_reordering = enabled;
        self
    }

    pub fn with_reorder_threshold(mut self, threshold: usize) -> Self {
        self.reorder_threshold = threshold;
        self
    }

    pub fn with_max_growth(mut self, factor: f64) -> Self {
        assert!(factor >= 1.0, "Max growth must be at least 1.0, got {}", factor);
        self.max_growth = factor;
        self
    }

    pub fn with_max_vars_sifted(mut self, count: usize) -> Self {
        self.max_vars_sifted = count;
        self
    }

    pub fn with_max_swaps(mut self, count: usize) -> Self {
        self.max_swaps = count;
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        assert!((2..=4).contains(&size), "Window size must be in range 2..=4, got {}", size);
        self.window_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BddConfig::default();
        assert_eq!(config.cache_bits, 16);
        assert_eq!(config.gc_limit, MIN_GC_LIMIT);
        assert!(config.gc_enabled);
        assert!(!config.dynamic_reordering);
        assert_eq!(config.reorder_technique, ReorderTechnique::Sift);
        assert_eq!(config.window_size, 3);
    }

    #[test]
    fn test_builders() {
        let config = BddConfig::default()
            .with_cache_bits(10)
            .with_gc(false)
            .with_window_size(4)
            .with_max_growth(1.5);
        assert_eq!(config.cache_bits, 10);
        assert!(!config.gc_enabled);
        assert_eq!(config.window_size, 4);
        assert_eq!(config.max_growth, 1.5);
    }

    #[test]
    #[should_panic(expected = "Window size must be in range 2..=4")]
    fn test_window_size_bounds() {
        let _ = BddConfig::default().with_window_size(5);
    }
}
