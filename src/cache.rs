//! Route resolution caching.
//!
//! This module provides [`ResolveCache`] — an LRU-based cache that avoids
//! re-resolving the route tree for paths that were recently navigated to. It
//! is gated behind the `cache` feature flag and uses the [`lru`] crate
//! internally.
//!
//! Keys are normalized full paths; values are the resolved [`MatchStack`]s.
//! [`CacheStats`] tracks hits, misses, and invalidations so cache
//! effectiveness can be monitored at runtime.
//!
//! # Examples
//!
//! ```
//! use fieldwork_navigator::cache::ResolveCache;
//! use fieldwork_navigator::resolve::MatchStack;
//!
//! let mut cache = ResolveCache::new();
//! cache.set("/projects/1".to_string(), MatchStack::new());
//!
//! assert!(cache.get("/projects/1").is_some());
//! assert_eq!(cache.stats().hits, 1);
//! ```

use crate::resolve::MatchStack;
use crate::{debug_log, trace_log};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Counters tracking cache hit/miss rates and invalidations.
///
/// Use [`hit_rate`](Self::hit_rate) for quick ratio access.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: usize,
    /// Number of cache misses.
    pub misses: usize,
    /// Number of full cache invalidations (via [`ResolveCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache for resolved match stacks.
///
/// Default capacity is 1000 entries. The cache must be cleared whenever the
/// route table changes; the navigator owns both and keeps them consistent.
#[derive(Debug)]
pub struct ResolveCache {
    entries: LruCache<String, MatchStack>,
    stats: CacheStats,
}

impl ResolveCache {
    const DEFAULT_CAPACITY: usize = 1000;

    /// Create a cache with the default capacity (1000 entries).
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache with a custom capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).expect("Cache capacity must be non-zero");
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Clear the cache and increment the invalidation counter.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "resolve cache cleared: {} entries removed ({} total invalidations, hit rate: {:.1}%)",
            len,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Look up the cached match stack for the given normalized `path`.
    ///
    /// Returns `None` on a cache miss. Updates hit/miss stats.
    pub fn get(&mut self, path: &str) -> Option<MatchStack> {
        if let Some(stack) = self.entries.get(path) {
            self.stats.hits += 1;
            trace_log!("resolve cache hit for path '{}'", path);
            Some(stack.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("resolve cache miss for path '{}'", path);
            None
        }
    }

    /// Insert a resolved match stack into the cache.
    pub fn set(&mut self, path: String, stack: MatchStack) {
        trace_log!("caching {}-level match stack for path '{}'", stack.len(), path);
        self.entries.push(path, stack);
    }

    /// Return a reference to the current cache statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset all counters in [`CacheStats`] to zero.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Return the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResolveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ResolveCache {
    fn clone(&self) -> Self {
        Self {
            entries: LruCache::new(self.entries.cap()),
            stats: self.stats.clone(),
        }
    }
}
