//! Memoization of recursive functions.
//!
//! Wrapping a recursive function in a [`Memoizer`](super::Memoizer) only
//! caches the outermost call: the function's own recursive calls still go
//! straight to the unwrapped function. A [`RecursiveMemoizer`] instead hands
//! the function a [`Recur`] handle and the function makes its recursive
//! calls through that handle, so every level of the recursion shares the
//! cache.
//!
//! # Examples
//!
//! ```rust
//! use memokit::memoize::memoize_recursive;
//!
//! let mut fibonacci = memoize_recursive(|recur, n: u64| {
//!     if n < 2 {
//!         Ok(n)
//!     } else {
//!         Ok(recur.call(n - 1)? + recur.call(n - 2)?)
//!     }
//! });
//!
//! assert_eq!(fibonacci.call(90).unwrap(), 2_880_067_194_370_816_120);
//! // one evaluation per distinct argument
//! assert_eq!(fibonacci.stats().misses, 91);
//! ```

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

use super::cache::MemoCache;
use super::stats::CacheStats;
use crate::error::{KeyError, MemoizeError};
use crate::key::{Derivation, KeyStrategy};

/// The type-erased recursive function seen by a [`Recur`] handle.
type RecursiveFn<'a, A, R, E> =
    dyn for<'r, 's> Fn(&'r mut Recur<'s, A, R, E>, A) -> Result<R, MemoizeError<E>> + 'a;

/// The handle a recursive function uses for its recursive calls.
///
/// Borrowed from the [`RecursiveMemoizer`] for the duration of one
/// top-level call.
pub struct Recur<'a, A, R, E> {
    function: &'a RecursiveFn<'a, A, R, E>,
    strategy: KeyStrategy,
    cache: &'a mut MemoCache<R>,
    stats: &'a mut CacheStats,
    depth: usize,
}

impl<A, R, E> Recur<'_, A, R, E>
where
    A: Serialize,
    R: Clone,
{
    /// Makes a recursive call through the shared cache.
    ///
    /// # Errors
    ///
    /// Same as [`RecursiveMemoizer::call`].
    pub fn call(&mut self, arguments: A) -> Result<R, MemoizeError<E>> {
        resolve(
            self.function,
            self.strategy,
            self.cache,
            self.stats,
            self.depth + 1,
            arguments,
        )
    }
}

impl<A, R, E> Recur<'_, A, R, E> {
    /// Returns how many recursive calls deep this handle is.
    ///
    /// The handle given to the top-level call has depth `0`.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if a recursive call with `arguments` would be served from the cache.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyError`] that [`call`](Self::call) would report.
    pub fn contains(&self, arguments: &A) -> Result<bool, KeyError>
    where
        A: Serialize,
    {
        Ok(match self.strategy.derive(arguments)? {
            Derivation::Cached(key) => self.cache.contains_key(&key),
            Derivation::Bypass => false,
        })
    }
}

fn resolve<A, R, E>(
    function: &RecursiveFn<'_, A, R, E>,
    strategy: KeyStrategy,
    cache: &mut MemoCache<R>,
    stats: &mut CacheStats,
    depth: usize,
    arguments: A,
) -> Result<R, MemoizeError<E>>
where
    A: Serialize,
    R: Clone,
{
    let key = match strategy.derive(&arguments)? {
        Derivation::Cached(key) => Some(key),
        Derivation::Bypass => None,
    };

    if let Some(value) = key.as_ref().and_then(|key| cache.get(key)) {
        stats.hits += 1;
        return Ok(value.clone());
    }

    if key.is_some() {
        stats.misses += 1;
    } else {
        stats.bypasses += 1;
    }

    let mut recur = Recur {
        function,
        strategy,
        cache: &mut *cache,
        stats: &mut *stats,
        depth,
    };
    let outcome = function(&mut recur, arguments);

    match (outcome, key) {
        (Ok(value), Some(key)) => Ok(cache.insert_if_absent(key, value).clone()),
        (Ok(value), None) => Ok(value),
        (Err(error), _) => {
            if error.is_compute() {
                stats.failures += 1;
            }
            Err(error)
        }
    }
}

/// A memoizer for functions that recurse through their own cache.
///
/// The wrapped function receives a [`Recur`] handle as its first argument
/// and must make its recursive calls with [`Recur::call`]. Because the
/// recursive step is wired explicitly, the function never refers to a
/// mutable binding of itself.
///
/// Recursive calls report key and compute failures as [`MemoizeError`], so
/// the wrapped function returns `Result<R, MemoizeError<E>>` and wraps its
/// own failures with [`MemoizeError::compute`].
///
/// # Examples
///
/// ```rust
/// use memokit::error::MemoizeError;
/// use memokit::memoize::RecursiveMemoizer;
///
/// // Number of lattice paths from (0, 0) to (x, y).
/// let mut paths = RecursiveMemoizer::new(|recur, (x, y): (u32, u32)| {
///     if x > 32 || y > 32 {
///         return Err(MemoizeError::compute("grid too large"));
///     }
///     if x == 0 || y == 0 {
///         return Ok(1_u64);
///     }
///     Ok(recur.call((x - 1, y))? + recur.call((x, y - 1))?)
/// });
///
/// assert_eq!(paths.call((16, 16)).unwrap(), 601_080_390);
/// assert!(paths.call((40, 1)).unwrap_err().is_compute());
/// ```
pub struct RecursiveMemoizer<A, R, E, F> {
    function: F,
    strategy: KeyStrategy,
    cache: MemoCache<R>,
    stats: CacheStats,
    marker: PhantomData<fn(A) -> Result<R, E>>,
}

impl<A, R, E, F> RecursiveMemoizer<A, R, E, F>
where
    F: Fn(&mut Recur<'_, A, R, E>, A) -> Result<R, MemoizeError<E>>,
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

    pub(crate) fn from_parts(function: F, strategy: KeyStrategy, cache: MemoCache<R>) -> Self {
        Self {
            function,
            strategy,
            cache,
            stats: CacheStats::default(),
            marker: PhantomData,
        }
    }

    /// Calls the wrapped function through the cache.
    ///
    /// Every recursive call made through the [`Recur`] handle follows the
    /// same lookup-then-compute-then-store steps as this top-level call.
    /// A failure anywhere in the recursion propagates to this caller;
    /// results computed by recursive calls that completed before the
    /// failure stay cached.
    ///
    /// # Errors
    ///
    /// - [`MemoizeError::Key`] if the arguments of this or any recursive
    ///   call cannot be keyed.
    /// - [`MemoizeError::Compute`] when the function reports a failure.
    pub fn call(&mut self, arguments: A) -> Result<R, MemoizeError<E>>
    where
        A: Serialize,
        R: Clone,
    {
        resolve(
            &self.function,
            self.strategy,
            &mut self.cache,
            &mut self.stats,
            0,
            arguments,
        )
    }
}

impl<A, R, E, F> RecursiveMemoizer<A, R, E, F> {
    /// Returns the key strategy chosen at construction.
    #[inline]
    pub const fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// Returns a read-only view of the cache.
    #[inline]
    pub const fn cache(&self) -> &MemoCache<R> {
        &self.cache
    }

    /// Returns the call counters, recursive calls included.
    #[inline]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns the number of cached results.
    #[inline]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns `true` if a call with `arguments` would be served from the cache.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyError`] that [`call`](Self::call) would report.
    pub fn contains(&self, arguments: &A) -> Result<bool, KeyError>
    where
        A: Serialize,
    {
        Ok(match self.strategy.derive(arguments)? {
            Derivation::Cached(key) => self.cache.contains_key(&key),
            Derivation::Bypass => false,
        })
    }

    /// Consumes the memoizer and returns its cache.
    #[inline]
    pub fn into_cache(self) -> MemoCache<R> {
        self.cache
    }
}

impl<A, R, E, F> fmt::Debug for RecursiveMemoizer<A, R, E, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RecursiveMemoizer")
            .field("strategy", &self.strategy)
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Memoizes an infallible recursive function with the structural key strategy.
///
/// The function's error type is [`Infallible`]; only key derivation can fail.
pub fn memoize_recursive<A, R, F>(function: F) -> RecursiveMemoizer<A, R, Infallible, F>
where
    F: Fn(&mut Recur<'_, A, R, Infallible>, A) -> Result<R, MemoizeError<Infallible>>,
{
    RecursiveMemoizer::new(function)
}
