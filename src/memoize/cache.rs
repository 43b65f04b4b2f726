//! The result store owned by a memoizer.

use std::collections::HashMap;
use std::collections::hash_map;

use crate::key::CacheKey;

#[cfg(feature = "fxhash")]
type KeyHasher = rustc_hash::FxBuildHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
type KeyHasher = ahash::RandomState;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
type KeyHasher = hash_map::RandomState;

/// A mapping from derived cache keys to computed results.
///
/// The cache only grows: entries are added on a cache miss and never
/// replaced, evicted or expired. Callers can read it through
/// [`Memoizer::cache`](super::Memoizer::cache) or take it back with
/// [`Memoizer::into_cache`](super::Memoizer::into_cache), but cannot insert
/// into it directly.
///
/// # Examples
///
/// ```rust
/// use memokit::key::CacheKey;
/// use memokit::memoize::memoize;
///
/// let mut double = memoize(|n: u32| n * 2);
/// double.call(4).unwrap();
///
/// let cache = double.into_cache();
/// assert_eq!(cache.len(), 1);
/// assert_eq!(cache.get(&CacheKey::Structural("4".to_string())), Some(&8));
/// ```
#[derive(Debug, Clone)]
pub struct MemoCache<V> {
    entries: HashMap<CacheKey, V, KeyHasher>,
}

impl<V> MemoCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(KeyHasher::default()),
        }
    }

    /// Returns the number of cached results.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the result stored under `key`.
    #[inline]
    pub fn get(&self, key: &CacheKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns `true` if a result is stored under `key`.
    #[inline]
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over all keys and results in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, CacheKey, V> {
        self.entries.iter()
    }

    /// Iterates over all keys in arbitrary order.
    pub fn keys(&self) -> hash_map::Keys<'_, CacheKey, V> {
        self.entries.keys()
    }

    /// Stores `value` under `key` unless a value is already there.
    ///
    /// Returns the value that ends up stored.
    pub(crate) fn insert_if_absent(&mut self, key: CacheKey, value: V) -> &V {
        self.entries.entry(key).or_insert(value)
    }

    #[cfg_attr(not(feature = "sync"), allow(dead_code))]
    pub(crate) fn get_or_insert_with(&mut self, key: CacheKey, create: impl FnOnce() -> V) -> &V {
        self.entries.entry(key).or_insert_with(create)
    }

    #[cfg_attr(not(feature = "sync"), allow(dead_code))]
    pub(crate) fn remove(&mut self, key: &CacheKey) -> Option<V> {
        self.entries.remove(key)
    }

    #[cfg_attr(not(feature = "sync"), allow(dead_code))]
    pub(crate) fn values(&self) -> hash_map::Values<'_, CacheKey, V> {
        self.entries.values()
    }
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V> IntoIterator for &'a MemoCache<V> {
    type Item = (&'a CacheKey, &'a V);
    type IntoIter = hash_map::Iter<'a, CacheKey, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> IntoIterator for MemoCache<V> {
    type Item = (CacheKey, V);
    type IntoIter = hash_map::IntoIter<CacheKey, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
