//! Construction of memoizers with a chosen strategy and a seeded cache.

use std::fmt;

use serde::Serialize;

use super::cache::MemoCache;
use super::memoizer::Memoizer;
use super::recursive::{Recur, RecursiveMemoizer};
#[cfg(feature = "sync")]
use super::sync::SyncMemoizer;
use crate::error::{KeyError, MemoizeError};
use crate::key::KeyStrategy;

/// Builds memoizers that start with known results.
///
/// Seeds are keyed when the memoizer is built, with the chosen strategy
/// under the [`Reject`](crate::key::ArityPolicy::Reject) policy: a seed
/// that could never be looked up fails the build. If two seeds share a key,
/// the first one is kept.
///
/// # Examples
///
/// ```rust
/// use memokit::memoize::MemoizerBuilder;
///
/// let mut lookup = MemoizerBuilder::new()
///     .seed("answer".to_string(), 42)
///     .build(|name: String| Ok::<_, String>(name.len() as i32))
///     .unwrap();
///
/// assert_eq!(lookup.call("answer".to_string()).unwrap(), 42);
/// assert_eq!(lookup.call("other".to_string()).unwrap(), 5);
/// assert_eq!(lookup.stats().hits, 1);
/// ```
pub struct MemoizerBuilder<A, R> {
    strategy: KeyStrategy,
    seeds: Vec<(A, R)>,
}

impl<A, R> MemoizerBuilder<A, R> {
    /// Starts a builder with the [`KeyStrategy::Structural`] strategy and no seeds.
    pub const fn new() -> Self {
        Self {
            strategy: KeyStrategy::Structural,
            seeds: Vec::new(),
        }
    }

    /// Sets the key strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: KeyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Adds a known result for `arguments`.
    #[must_use]
    pub fn seed(mut self, arguments: A, value: R) -> Self {
        self.seeds.push((arguments, value));
        self
    }

    /// Adds several known results.
    #[must_use]
    pub fn seeds<I>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = (A, R)>,
    {
        self.seeds.extend(seeds);
        self
    }

    fn into_parts(self) -> Result<(KeyStrategy, MemoCache<R>), KeyError>
    where
        A: Serialize,
    {
        let mut cache = MemoCache::new();
        for (arguments, value) in self.seeds {
            let key = self.strategy.derive_strict(&arguments)?;
            cache.insert_if_absent(key, value);
        }
        Ok((self.strategy, cache))
    }

    /// Builds a [`Memoizer`] around `function`.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyError`] of the first seed that cannot be keyed.
    pub fn build<E, F>(self, function: F) -> Result<Memoizer<A, R, E, F>, KeyError>
    where
        A: Serialize,
        F: FnMut(A) -> Result<R, E>,
    {
        let (strategy, cache) = self.into_parts()?;
        Ok(Memoizer::from_parts(function, strategy, cache))
    }

    /// Builds a [`RecursiveMemoizer`] around `function`.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyError`] of the first seed that cannot be keyed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use memokit::memoize::{MemoizerBuilder, Recur};
    /// use std::convert::Infallible;
    ///
    /// // Seeding the base cases removes them from the function body.
    /// let mut fibonacci = MemoizerBuilder::new()
    ///     .seeds([(0_u64, 0_u64), (1, 1)])
    ///     .build_recursive(|recur: &mut Recur<'_, u64, u64, Infallible>, n: u64| {
    ///         Ok(recur.call(n - 1)? + recur.call(n - 2)?)
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(fibonacci.call(20).unwrap(), 6765);
    /// ```
    pub fn build_recursive<E, F>(self, function: F) -> Result<RecursiveMemoizer<A, R, E, F>, KeyError>
    where
        A: Serialize,
        F: Fn(&mut Recur<'_, A, R, E>, A) -> Result<R, MemoizeError<E>>,
    {
        let (strategy, cache) = self.into_parts()?;
        Ok(RecursiveMemoizer::from_parts(function, strategy, cache))
    }

    /// Builds a [`SyncMemoizer`] around `function`.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyError`] of the first seed that cannot be keyed.
    #[cfg(feature = "sync")]
    pub fn build_sync<E, F>(self, function: F) -> Result<SyncMemoizer<A, R, E, F>, KeyError>
    where
        A: Serialize,
        F: Fn(A) -> Result<R, E>,
    {
        let (strategy, cache) = self.into_parts()?;
        Ok(SyncMemoizer::from_parts(function, strategy, cache))
    }
}

impl<A, R> Default for MemoizerBuilder<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for MemoizerBuilder<A, R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MemoizerBuilder")
            .field("strategy", &self.strategy)
            .field("seeds", &self.seeds.len())
            .finish()
    }
}
