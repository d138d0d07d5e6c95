//! Byte-budgeted LRU cache for materialized raster windows.
//!
//! [`WindowCache`] is deliberately decoupled from [`crate::store`]: it never
//! populates itself. Callers that want caching materialize a window (for
//! example via [`crate::store::WindowView::to_vec`]), `put` it, and `get` it
//! back on later requests. Entries are keyed by window geometry alone, which
//! relies on the system invariant that the content at a fixed rectangle never
//! changes.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

/// Composite cache key: the window rectangle.
///
/// A plain hashed record rather than a bit-packed integer, so coordinates of
/// any magnitude never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Map plus recency order, guarded by one lock.
#[derive(Default)]
struct CacheInner {
    entries: HashMap<WindowKey, Arc<[u8]>>,
    /// Front = least recently used, back = most recently used.
    order: VecDeque<WindowKey>,
    occupied: usize,
}

impl CacheInner {
    /// Move `key` to the most-recently-used position.
    ///
    /// Linear in the entry count. Window caches hold at most a few hundred
    /// entries under any realistic byte budget, so the scan stays cheaper
    /// than maintaining an intrusive recency list; revisit if budgets grow
    /// by orders of magnitude.
    fn promote(&mut self, key: &WindowKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(*key);
        }
    }
}

/// Thread-safe LRU cache of window bytes, bounded by total resident bytes.
///
/// One exclusive lock serializes `get`/`put`/`clear`; hit/miss counters are
/// atomics and readable without it. All operations are bounded and in-memory.
///
/// # Example
///
/// ```ignore
/// use geoslice::WindowCache;
///
/// let cache = WindowCache::new(256 * 1024 * 1024);
/// if cache.get(100, 100, 512, 512).is_none() {
///     let bytes = store.get_window(100, 100, 512, 512)?.to_vec();
///     cache.put(100, 100, 512, 512, bytes);
/// }
/// ```
pub struct WindowCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl WindowCache {
    /// Default byte budget: 256 MiB.
    pub const DEFAULT_CAPACITY: usize = 256 * 1024 * 1024;

    /// Create a cache bounded to `capacity` total resident bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a window by geometry.
    ///
    /// A hit promotes the entry to most-recently-used, counts a hit, and
    /// returns the stored bytes without copying them. A miss counts a miss.
    pub fn get(&self, x: i64, y: i64, width: i64, height: i64) -> Option<Arc<[u8]>> {
        let key = WindowKey {
            x,
            y,
            width,
            height,
        };
        let mut inner = self.inner.lock();
        match inner.entries.get(&key).cloned() {
            Some(bytes) => {
                inner.promote(&key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bytes)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a materialized window.
    ///
    /// If the key is already present the call only promotes recency; the
    /// stored bytes are never replaced, because window content at a fixed
    /// rectangle is immutable in this system. Otherwise least-recently-used
    /// entries are evicted until the new entry fits. An entry larger than the
    /// whole capacity still goes in after the cache has emptied itself,
    /// temporarily exceeding the budget.
    pub fn put(&self, x: i64, y: i64, width: i64, height: i64, bytes: Vec<u8>) {
        let key = WindowKey {
            x,
            y,
            width,
            height,
        };
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.promote(&key);
            return;
        }

        let size = bytes.len();
        while inner.occupied + size > self.capacity && !inner.order.is_empty() {
            let victim = inner.order.pop_front().expect("order non-empty");
            if let Some(evicted) = inner.entries.remove(&victim) {
                inner.occupied -= evicted.len();
                trace!(
                    "evicted window x={} y={} w={} h={} ({} bytes)",
                    victim.x,
                    victim.y,
                    victim.width,
                    victim.height,
                    evicted.len()
                );
            }
        }

        inner.entries.insert(key, Arc::from(bytes));
        inner.order.push_back(key);
        inner.occupied += size;
    }

    /// Drop every entry and reset the occupied-byte counter.
    ///
    /// Hit/miss counters are unaffected.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.occupied = 0;
    }

    /// Total resident bytes.
    pub fn size(&self) -> usize {
        self.inner.lock().occupied
    }

    /// Number of cached windows.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// The configured byte budget.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that found nothing.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for WindowCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
