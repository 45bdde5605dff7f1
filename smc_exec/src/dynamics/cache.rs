//! Inertia matrix cache
//!
//! A small fixed capacity cache of inertia matrices keyed by the exact bit
//! pattern of the joint angles. It is a pure performance optimisation and is
//! disabled by default. The cache is the only mutable state in the dynamics
//! engine, which keeps it behind a lock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Matrix3;
use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default number of slots in the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Key of a cache entry, the bit patterns of `(theta_1, theta_2)`.
pub type CacheKey = (u64, u64);

/// Fixed capacity inertia matrix cache with round robin replacement.
#[derive(Debug, Clone)]
pub struct MatrixCache {
    enabled: bool,
    slots: Vec<Option<(CacheKey, Matrix3<f64>)>>,
    next_slot: usize,
    hits: u64,
    misses: u64,
}

/// Usage statistics of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MatrixCache {

    /// Create a new, disabled, cache with the given number of slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            enabled: false,
            slots: vec![None; capacity.max(1)],
            next_slot: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Build the key for a pair of joint angles.
    pub fn key(theta_1: f64, theta_2: f64) -> CacheKey {
        (theta_1.to_bits(), theta_2.to_bits())
    }

    /// Enable the cache.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the cache, dropping all entries.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.invalidate();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up an entry. Always misses (without counting) when disabled.
    pub fn get(&mut self, key: CacheKey) -> Option<Matrix3<f64>> {
        if !self.enabled {
            return None;
        }

        let found = self.slots
            .iter()
            .flatten()
            .find(|(k, _)| *k == key)
            .map(|(_, m)| *m);

        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1
        }

        found
    }

    /// Insert an entry, replacing the oldest slot once full. Does nothing
    /// when disabled.
    pub fn insert(&mut self, key: CacheKey, matrix: Matrix3<f64>) {
        if !self.enabled {
            return;
        }

        let capacity = self.slots.len();
        self.slots[self.next_slot] = Some((key, matrix));
        self.next_slot = (self.next_slot + 1) % capacity;
    }

    /// Drop every entry and reset the statistics.
    pub fn invalidate(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.next_slot = 0;
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.slots.iter().filter(|s| s.is_some()).count(),
            capacity: self.slots.len(),
        }
    }
}

impl Default for MatrixCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let mut cache = MatrixCache::default();
        let key = MatrixCache::key(0.1, 0.2);

        cache.insert(key, Matrix3::identity());

        assert!(!cache.is_enabled());
        assert_eq!(cache.get(key), None);
        assert_eq!(cache.stats().len, 0);
    }

    #[test]
    fn test_hit_and_miss() {
        let mut cache = MatrixCache::default();
        cache.enable();

        let key = MatrixCache::key(0.1, 0.2);
        assert_eq!(cache.get(key), None);

        cache.insert(key, Matrix3::identity() * 2.0);
        assert_eq!(cache.get(key), Some(Matrix3::identity() * 2.0));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.len), (1, 1, 1));
    }

    #[test]
    fn test_round_robin_replacement() {
        let mut cache = MatrixCache::new(2);
        cache.enable();

        cache.insert(MatrixCache::key(1.0, 0.0), Matrix3::identity());
        cache.insert(MatrixCache::key(2.0, 0.0), Matrix3::identity());
        cache.insert(MatrixCache::key(3.0, 0.0), Matrix3::identity());

        // The first entry was evicted
        assert_eq!(cache.get(MatrixCache::key(1.0, 0.0)), None);
        assert!(cache.get(MatrixCache::key(2.0, 0.0)).is_some());
        assert!(cache.get(MatrixCache::key(3.0, 0.0)).is_some());
        assert_eq!(cache.stats().len, 2);
    }

    #[test]
    fn test_invalidate_and_disable() {
        let mut cache = MatrixCache::default();
        cache.enable();
        cache.insert(MatrixCache::key(0.0, 0.0), Matrix3::identity());

        cache.invalidate();
        assert_eq!(cache.stats().len, 0);
        assert!(cache.is_enabled());

        cache.insert(MatrixCache::key(0.0, 0.0), Matrix3::identity());
        cache.disable();
        assert!(!cache.is_enabled());
        assert_eq!(cache.stats().len, 0);
    }
}
