//! Memoizers.
//!
//! A memoizer wraps a deterministic function and caches its results by
//! argument, so repeated calls with equal arguments skip the computation.
//!
//! - [`Memoizer`]: the sequential memoizer, `call(&mut self, A)`
//! - [`RecursiveMemoizer`]: for recursive functions, which make their
//!   recursive calls through a [`Recur`] handle that shares the cache
//! - [`SyncMemoizer`]: `call(&self, A)` with at-most-once computation per
//!   key across threads (feature `sync`)
//! - [`MemoizerBuilder`]: choose the key strategy and seed known results
//!
//! Every memoizer owns its cache. Two memoizers never share entries, even
//! when they wrap the same function.
//!
//! # Examples
//!
//! ```rust
//! use memokit::memoize::memoize;
//! use std::cell::Cell;
//!
//! let calls = Cell::new(0);
//! let mut double = memoize(|n: i32| {
//!     calls.set(calls.get() + 1);
//!     n * 2
//! });
//!
//! assert_eq!(double.call(5).unwrap(), 10);
//! assert_eq!(double.call(5).unwrap(), 10);
//! assert_eq!(calls.get(), 1);
//! assert_eq!(double.call(6).unwrap(), 12);
//! assert_eq!(calls.get(), 2);
//! ```

mod builder;
mod cache;
pub(crate) mod local;
mod memoizer;
mod recursive;
mod stats;
#[cfg(feature = "sync")]
mod sync;

pub use builder::MemoizerBuilder;
pub use cache::MemoCache;
pub use memoizer::{Memoizer, memoize, memoize_with, try_memoize, try_memoize_with};
pub use recursive::{Recur, RecursiveMemoizer, memoize_recursive};
pub use stats::CacheStats;
#[cfg(feature = "sync")]
pub use sync::SyncMemoizer;
