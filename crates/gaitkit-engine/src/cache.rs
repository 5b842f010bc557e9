//! Cycle block cache
//!
//! Reshaped blocks are memoized per (subject, task, feature set). The
//! [`CycleCache`] trait is the single place where the retention policy is
//! decided:
//!
//! - [`UnboundedCache`] keeps every block until cleared (the default)
//! - [`LruCache`] keeps at most `capacity` blocks and evicts the least
//!   recently used one
//!
//! Cached values are `Arc<CycleBlock>`, so a hit hands out the very same
//! backing array that a previous call returned.

use std::{collections::HashMap, fmt, sync::Arc};

use linked_hash_map::LinkedHashMap;
use tracing::debug;

use crate::cycle_block::CycleBlock;

/// Cache key: subject, task, and the resolved feature names in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject: String,
    pub task: String,
    pub features: Vec<String>,
}

impl CacheKey {
    #[must_use]
    pub fn new(subject: &str, task: &str, features: &[String]) -> Self {
        let mut features = features.to_vec();
        features.sort();
        Self {
            subject: subject.to_owned(),
            task: task.to_owned(),
            features,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.subject, self.task, self.features.join(","))
    }
}

pub trait CycleCache: fmt::Debug + Send + Sync {
    fn get(&mut self, key: &CacheKey) -> Option<Arc<CycleBlock>>;
    fn insert(&mut self, key: CacheKey, block: Arc<CycleBlock>);
    fn remove(&mut self, key: &CacheKey) -> Option<Arc<CycleBlock>>;
    fn clear(&mut self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type BoxedCycleCache = Box<dyn CycleCache>;

/// Builds the cache matching an optional capacity.
#[must_use]
pub fn cache_for_capacity(capacity: Option<usize>) -> BoxedCycleCache {
    match capacity {
        Some(capacity) => Box::new(LruCache::new(capacity)),
        None => Box::new(UnboundedCache::default()),
    }
}

/// Plain memoization table; entries live until [`CycleCache::clear`].
#[derive(Debug, Default)]
pub struct UnboundedCache {
    entries: HashMap<CacheKey, Arc<CycleBlock>>,
}

impl CycleCache for UnboundedCache {
    fn get(&mut self, key: &CacheKey) -> Option<Arc<CycleBlock>> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, block: Arc<CycleBlock>) {
        self.entries.insert(key, block);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Arc<CycleBlock>> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Least-recently-used cache holding at most `capacity` blocks.
#[derive(Debug)]
pub struct LruCache {
    capacity: usize,
    entries: LinkedHashMap<CacheKey, Arc<CycleBlock>>,
}

impl LruCache {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU capacity must be positive");
        Self {
            capacity,
            entries: LinkedHashMap::new(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl CycleCache for LruCache {
    fn get(&mut self, key: &CacheKey) -> Option<Arc<CycleBlock>> {
        self.entries.get_refresh(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, block: Arc<CycleBlock>) {
        self.entries.insert(key, block);
        while self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_front() {
                debug!(key = %evicted, "evicted cycle block");
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Arc<CycleBlock>> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
