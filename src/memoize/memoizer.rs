//! The sequential memoizer.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

use super::cache::MemoCache;
use super::stats::CacheStats;
use crate::error::{KeyError, MemoizeError};
use crate::key::{Derivation, KeyStrategy};

/// A function wrapped with a private result cache.
///
/// `Memoizer<A, R, E, F>` owns the wrapped function `F: FnMut(A) -> Result<R, E>`,
/// the [`KeyStrategy`] chosen at construction and a [`MemoCache`] that only
/// this instance can write to. [`call`](Self::call) is the only operation
/// that touches the cache.
///
/// # Type Parameters
///
/// * `A` - The argument value. Use a tuple for several arguments and `()` for none.
/// * `R` - The result type. Cached results are handed out as clones.
/// * `E` - The error type of the wrapped function.
/// * `F` - The wrapped function.
///
/// # Purity
///
/// The wrapped function is assumed to be deterministic and free of side
/// effects. This is not checked: an impure function is only called for the
/// first call per key, and every later call replays that first result.
///
/// # Examples
///
/// ```rust
/// use memokit::memoize::Memoizer;
///
/// let mut parse = Memoizer::new(|text: String| text.parse::<i32>());
///
/// assert_eq!(parse.call("42".to_string()).unwrap(), 42);
/// assert!(parse.call("forty-two".to_string()).unwrap_err().is_compute());
/// assert_eq!(parse.len(), 1);
/// ```
pub struct Memoizer<A, R, E, F> {
    function: F,
    strategy: KeyStrategy,
    cache: MemoCache<R>,
    stats: CacheStats,
    marker: PhantomData<fn(A) -> Result<R, E>>,
}

impl<A, R, E, F> Memoizer<A, R, E, F>
where
    F: FnMut(A) -> Result<R, E>,
{
    /// Wraps `function` with the [`KeyStrategy::Structural`] strategy.
    #[inline]
    pub fn new(function: F) -> Self {
        Self::with_strategy(function, KeyStrategy::Structural)
    }

    /// Wraps `function` with the given key strategy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use memokit::key::{ArityPolicy, KeyStrategy};
    /// use memokit::memoize::Memoizer;
    ///
    /// let mut shout = Memoizer::with_strategy(
    ///     |word: &str| Ok::<_, ()>(word.to_uppercase()),
    ///     KeyStrategy::SinglePrimitive(ArityPolicy::Reject),
    /// );
    /// assert_eq!(shout.call("hi").unwrap(), "HI");
    /// ```
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
    /// 1. Derives the key for `arguments`.
    /// 2. Returns a clone of the cached result if there is one.
    /// 3. Otherwise invokes the function, caches the result and returns it.
    ///
    /// A failed invocation caches nothing, so the next call with the same
    /// arguments invokes the function again.
    ///
    /// # Errors
    ///
    /// - [`MemoizeError::Key`] if the arguments cannot be keyed. The function
    ///   is not invoked.
    /// - [`MemoizeError::Compute`] with the function's own error.
    pub fn call(&mut self, arguments: A) -> Result<R, MemoizeError<E>>
    where
        A: Serialize,
        R: Clone,
    {
        let key = match self.strategy.derive(&arguments)? {
            Derivation::Cached(key) => key,
            Derivation::Bypass => {
                self.stats.bypasses += 1;
                return self.invoke(arguments);
            }
        };

        if let Some(value) = self.cache.get(&key) {
            self.stats.hits += 1;
            return Ok(value.clone());
        }

        self.stats.misses += 1;
        let value = self.invoke(arguments)?;
        Ok(self.cache.insert_if_absent(key, value).clone())
    }

    fn invoke(&mut self, arguments: A) -> Result<R, MemoizeError<E>> {
        match (self.function)(arguments) {
            Ok(value) => Ok(value),
            Err(error) => {
                self.stats.failures += 1;
                Err(MemoizeError::Compute(error))
            }
        }
    }
}

impl<A, R, E, F> Memoizer<A, R, E, F> {
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

    /// Returns the call counters.
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

impl<A, R, E, F> fmt::Debug for Memoizer<A, R, E, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Memoizer")
            .field("strategy", &self.strategy)
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Memoizes an infallible function with the structural key strategy.
///
/// The returned memoizer still reports [`MemoizeError::Key`] for arguments
/// that cannot be keyed; its compute error type is [`Infallible`].
///
/// # Examples
///
/// ```rust
/// use memokit::memoize::memoize;
///
/// let mut add = memoize(|(left, right): (i32, i32)| left + right);
/// assert_eq!(add.call((1, 2)).unwrap(), 3);
/// assert_eq!(add.call((1, 2)).unwrap(), 3);
/// assert_eq!(add.stats().misses, 1);
/// ```
pub fn memoize<A, R, G>(function: G) -> Memoizer<A, R, Infallible, impl FnMut(A) -> Result<R, Infallible>>
where
    G: FnMut(A) -> R,
{
    memoize_with(function, KeyStrategy::Structural)
}

/// Memoizes an infallible function with the given key strategy.
pub fn memoize_with<A, R, G>(
    mut function: G,
    strategy: KeyStrategy,
) -> Memoizer<A, R, Infallible, impl FnMut(A) -> Result<R, Infallible>>
where
    G: FnMut(A) -> R,
{
    Memoizer::with_strategy(move |arguments: A| Ok(function(arguments)), strategy)
}

/// Memoizes a fallible function with the structural key strategy.
///
/// Errors are never cached.
///
/// # Examples
///
/// ```rust
/// use memokit::memoize::try_memoize;
///
/// let mut checked = try_memoize(|(left, right): (u8, u8)| left.checked_add(right).ok_or("overflow"));
/// assert_eq!(checked.call((200, 55)).unwrap(), 255);
/// assert!(checked.call((200, 56)).is_err());
/// assert_eq!(checked.len(), 1);
/// ```
pub fn try_memoize<A, R, E, F>(function: F) -> Memoizer<A, R, E, F>
where
    F: FnMut(A) -> Result<R, E>,
{
    Memoizer::new(function)
}

/// Memoizes a fallible function with the given key strategy.
pub fn try_memoize_with<A, R, E, F>(function: F, strategy: KeyStrategy) -> Memoizer<A, R, E, F>
where
    F: FnMut(A) -> Result<R, E>,
{
    Memoizer::with_strategy(function, strategy)
}
