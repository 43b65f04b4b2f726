//! Runtime support for the `#[memoized]` attribute.
//!
//! Each annotated function owns one thread-local [`LocalCache`] and routes
//! every call, recursive calls included, through [`resolve_local`], or
//! through [`resolve_local_fallible`] when it returns a `Result`.

use std::cell::RefCell;
use std::thread::LocalKey;

use serde::Serialize;

use super::cache::MemoCache;
use crate::key::KeyStrategy;

/// The per-thread cache of one `#[memoized]` function.
pub type LocalCache<R> = RefCell<MemoCache<R>>;

/// Creates an empty [`LocalCache`].
pub fn local_cache<R>() -> LocalCache<R> {
    RefCell::new(MemoCache::new())
}

/// Looks `arguments` up in `cache`, running `compute(arguments)` on a miss.
///
/// No borrow of the cache is held while `compute` runs, so `compute` may
/// call back into the same memoized function.
///
/// # Panics
///
/// Panics with the [`KeyError`](crate::error::KeyError) message if the
/// arguments cannot be keyed structurally.
pub fn resolve_local<A, R>(
    cache: &'static LocalKey<LocalCache<R>>,
    arguments: A,
    compute: impl FnOnce(A) -> R,
) -> R
where
    A: Serialize,
    R: Clone + 'static,
{
    let key = match KeyStrategy::Structural.derive_strict(&arguments) {
        Ok(key) => key,
        Err(error) => panic!("memoized function called with unkeyable arguments: {error}"),
    };

    if let Some(value) = cache.with(|cache| cache.borrow().get(&key).cloned()) {
        return value;
    }

    let value = compute(arguments);
    cache.with(|cache| cache.borrow_mut().insert_if_absent(key, value).clone())
}

/// The value a fallible `#[memoized]` function caches.
///
/// Implemented for `Result<T, E>` only; the cache holds `T` and an `Err` is
/// never stored.
pub trait Fallible {
    /// The success type.
    type Value;
}

impl<T, E> Fallible for Result<T, E> {
    type Value = T;
}

/// Like [`resolve_local`], but only `Ok` values are stored.
///
/// An `Err` is returned to the caller and the next call with the same
/// arguments runs `compute` again.
///
/// # Errors
///
/// Returns the error produced by `compute`.
///
/// # Panics
///
/// Panics with the [`KeyError`](crate::error::KeyError) message if the
/// arguments cannot be keyed structurally.
pub fn resolve_local_fallible<A, T, E>(
    cache: &'static LocalKey<LocalCache<T>>,
    arguments: A,
    compute: impl FnOnce(A) -> Result<T, E>,
) -> Result<T, E>
where
    A: Serialize,
    T: Clone + 'static,
{
    let key = match KeyStrategy::Structural.derive_strict(&arguments) {
        Ok(key) => key,
        Err(error) => panic!("memoized function called with unkeyable arguments: {error}"),
    };

    if let Some(value) = cache.with(|cache| cache.borrow().get(&key).cloned()) {
        return Ok(value);
    }

    let value = compute(arguments)?;
    Ok(cache.with(|cache| cache.borrow_mut().insert_if_absent(key, value).clone()))
}

/// Returns the number of results `cache` holds on the current thread.
pub fn local_len<R: 'static>(cache: &'static LocalKey<LocalCache<R>>) -> usize {
    cache.with(|cache| cache.borrow().len())
}
