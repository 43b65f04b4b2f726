//! Call counters kept by every memoizer.

/// Counts how the calls to a memoizer were served.
///
/// - `hits`: answered from the cache without invoking the function
/// - `misses`: the function was invoked because the key was not cached
/// - `bypasses`: the key strategy declined to key the call and the function
///   was invoked directly
/// - `failures`: invocations (misses or bypasses) that returned an error
///
/// Calls rejected by key derivation are not counted.
///
/// # Examples
///
/// ```rust
/// use memokit::memoize::{CacheStats, memoize};
///
/// let mut square = memoize(|n: i64| n * n);
/// square.call(3).unwrap();
/// square.call(3).unwrap();
///
/// assert_eq!(
///     square.stats(),
///     CacheStats { hits: 1, misses: 1, bypasses: 0, failures: 0 }
/// );
/// assert_eq!(square.stats().invocations(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CacheStats {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls that invoked the function on a cache miss.
    pub misses: u64,
    /// Calls that invoked the function without consulting the cache.
    pub bypasses: u64,
    /// Invocations that returned an error.
    pub failures: u64,
}

impl CacheStats {
    /// Returns the number of times the wrapped function was invoked.
    #[inline]
    pub const fn invocations(&self) -> u64 {
        self.misses + self.bypasses
    }

    /// Returns the number of calls that were counted.
    #[inline]
    pub const fn calls(&self) -> u64 {
        self.hits + self.misses + self.bypasses
    }

    /// Returns the share of keyed calls served from the cache, in `0.0..=1.0`.
    ///
    /// Returns `0.0` before the first keyed call.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        let keyed = self.hits + self.misses;
        if keyed == 0 {
            0.0
        } else {
            self.hits as f64 / keyed as f64
        }
    }
}

#[cfg(feature = "sync")]
pub(crate) use atomic::AtomicCacheStats;

#[cfg(feature = "sync")]
mod atomic {
    use super::CacheStats;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Default)]
    pub struct AtomicCacheStats {
        hits: AtomicU64,
        misses: AtomicU64,
        bypasses: AtomicU64,
        failures: AtomicU64,
    }

    impl AtomicCacheStats {
        pub fn hit(&self) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        pub fn miss(&self) {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        pub fn bypass(&self) {
            self.bypasses.fetch_add(1, Ordering::Relaxed);
        }

        pub fn failure(&self) {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        pub fn snapshot(&self) -> CacheStats {
            CacheStats {
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
                bypasses: self.bypasses.load(Ordering::Relaxed),
                failures: self.failures.load(Ordering::Relaxed),
            }
        }
    }
}
