//! A memoizer that can be shared between threads.
//!
//! For every key the lookup, the computation and the store form one
//! critical section: concurrent callers with the same uncached key wait for
//! the first caller to finish and then read its result, so the wrapped
//! function runs at most once per key. Calls with different keys compute
//! in parallel.
//!
//! # Examples
//!
//! ```rust
//! use memokit::memoize::SyncMemoizer;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cube = Arc::new(SyncMemoizer::new(|n: u64| Ok::<_, ()>(n * n * n)));
//!
//! let handles: Vec<_> = (0..8)
//!     .map(|_| {
//!         let cube = Arc::clone(&cube);
//!         thread::spawn(move || cube.call(3).unwrap())
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), 27);
//! }
//! assert_eq!(cube.stats().misses, 1);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::cache::MemoCache;
use super::stats::{AtomicCacheStats, CacheStats};
use crate::error::{KeyError, MemoizeError};
use crate::key::{CacheKey, Derivation, KeyStrategy};

/// The per-key cell. Empty until a computation for the key succeeds.
type Slot<R> = Arc<Mutex<Option<R>>>;

/// A thread-safe memoizer.
///
/// Like [`Memoizer`](super::Memoizer), but [`call`](Self::call) takes
/// `&self` and the wrapped function must be `Fn`. Share it between threads
/// with an [`Arc`].
///
/// # Deadlocks
///
/// The wrapped function must not call the same `SyncMemoizer` with the key
/// it is currently computing; that call waits on itself.
///
/// # Thread Safety
///
/// `SyncMemoizer` is `Send + Sync` when `F: Send + Sync` and `R: Send`.
pub struct SyncMemoizer<A, R, E, F> {
    function: F,
    strategy: KeyStrategy,
    slots: Mutex<MemoCache<Slot<R>>>,
    stats: AtomicCacheStats,
    marker: PhantomData<fn(A) -> Result<R, E>>,
}

impl<A, R, E, F> SyncMemoizer<A, R, E, F>
where
    F: Fn(A) -> Result<R, E>,
{
    /// Wraps `function` with the [`KeyStrategy::Structural`] strategy.
    #[inline]
    pub fn new(function: F) -> Self {
        Self::with_strategy(function, KeyStrategy::Structural)
    }

    /// Wraps `function` with the given key strategy.
    #[inline]
    pub fn with_strategy(function: F, strategy: KeyStrategy) -> Self {
        Self::from_parts(function, strategy, MemoCache::new())
    }

    pub(crate) fn from_parts(function: F, strategy: KeyStrategy, seeds: MemoCache<R>) -> Self {
        let mut slots = MemoCache::new();
        for (key, value) in seeds {
            slots.insert_if_absent(key, Arc::new(Mutex::new(Some(value))));
        }
        Self {
            function,
            strategy,
            slots: Mutex::new(slots),
            stats: AtomicCacheStats::default(),
            marker: PhantomData,
        }
    }

    /// Calls the wrapped function through the cache.
    ///
    /// # Errors
    ///
    /// - [`MemoizeError::Key`] if the arguments cannot be keyed.
    /// - [`MemoizeError::Compute`] with the function's own error. The key
    ///   stays uncached and the next caller retries.
    pub fn call(&self, arguments: A) -> Result<R, MemoizeError<E>>
    where
        A: Serialize,
        R: Clone,
    {
        let key = match self.strategy.derive(&arguments)? {
            Derivation::Cached(key) => key,
            Derivation::Bypass => {
                self.stats.bypass();
                return self.invoke(arguments);
            }
        };

        let slot = self.slot(key.clone());
        // Declared before the guard so it runs after the slot is unlocked
        let mut vacancy = Vacancy {
            slots: &self.slots,
            key,
            slot: &slot,
            filled: false,
        };
        let mut guard = slot.lock();
        if let Some(value) = guard.as_ref() {
            vacancy.filled = true;
            self.stats.hit();
            return Ok(value.clone());
        }

        self.stats.miss();
        let value = self.invoke(arguments)?;
        *guard = Some(value.clone());
        vacancy.filled = true;
        Ok(value)
    }

    fn slot(&self, key: CacheKey) -> Slot<R> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.get_or_insert_with(key, || Arc::new(Mutex::new(None))))
    }

    fn invoke(&self, arguments: A) -> Result<R, MemoizeError<E>> {
        (self.function)(arguments).map_err(|error| {
            self.stats.failure();
            MemoizeError::Compute(error)
        })
    }
}

impl<A, R, E, F> SyncMemoizer<A, R, E, F> {
    /// Returns the key strategy chosen at construction.
    #[inline]
    pub const fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// Returns a snapshot of the call counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Returns the number of cached results.
    ///
    /// Keys whose computation is still running or has failed are not counted.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    /// Returns `true` if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a call with `arguments` would be served from the cache.
    ///
    /// Waits for a computation of the same key that is still running.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyError`] that [`call`](Self::call) would report.
    pub fn contains(&self, arguments: &A) -> Result<bool, KeyError>
    where
        A: Serialize,
    {
        let Derivation::Cached(key) = self.strategy.derive(arguments)? else {
            return Ok(false);
        };
        let slot = self.slots.lock().get(&key).map(Arc::clone);
        Ok(slot.is_some_and(|slot| slot.lock().is_some()))
    }

    /// Consumes the memoizer and returns the cached results.
    pub fn into_cache(self) -> MemoCache<R> {
        let mut cache = MemoCache::new();
        for (key, slot) in self.slots.into_inner() {
            let value = Arc::try_unwrap(slot).map_or_else(|shared| shared.lock().take(), Mutex::into_inner);
            if let Some(value) = value {
                cache.insert_if_absent(key, value);
            }
        }
        cache
    }
}

/// Removes a slot that is still empty when its caller leaves, whether the
/// computation failed or panicked.
///
/// Callers obtain a slot only while holding the `slots` lock, so a strong
/// count of 2 (the map and this caller) under that lock means nobody else
/// can reach it.
struct Vacancy<'a, R> {
    slots: &'a Mutex<MemoCache<Slot<R>>>,
    key: CacheKey,
    slot: &'a Slot<R>,
    filled: bool,
}

impl<R> Drop for Vacancy<'_, R> {
    fn drop(&mut self) {
        if self.filled {
            return;
        }
        let mut slots = self.slots.lock();
        if Arc::strong_count(self.slot) == 2 && self.slot.lock().is_none() {
            slots.remove(&self.key);
        }
    }
}

impl<A, R, E, F> fmt::Debug for SyncMemoizer<A, R, E, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncMemoizer")
            .field("strategy", &self.strategy)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(
    SyncMemoizer<u64, String, (), fn(u64) -> Result<String, ()>>: Send, Sync
);
static_assertions::assert_not_impl_any!(
    SyncMemoizer<u64, std::rc::Rc<u64>, (), fn(u64) -> Result<std::rc::Rc<u64>, ()>>: Send, Sync
);
