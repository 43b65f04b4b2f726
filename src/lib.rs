//! # memokit
//!
//! Function memoization for Rust with configurable cache-key derivation.
//!
//! ## Overview
//!
//! A memoizer wraps a deterministic, side-effect-free function and caches
//! its results by argument. Repeated calls with equal arguments return the
//! cached result instead of recomputing it. This crate provides:
//!
//! - **Key derivation**: a [`KeyStrategy`](key::KeyStrategy) chosen at
//!   construction, either the single primitive argument itself or a
//!   canonical structural encoding of all arguments
//! - **Memoizers**: [`Memoizer`](memoize::Memoizer),
//!   [`RecursiveMemoizer`](memoize::RecursiveMemoizer) for recursive
//!   functions and [`SyncMemoizer`](memoize::SyncMemoizer) for threads
//! - **Errors** that keep "the function failed" apart from "the arguments
//!   cannot be keyed"
//! - **`#[memoized]`**: an attribute that memoizes a free function,
//!   recursive calls included
//!
//! ## Feature Flags
//!
//! - `sync`: `SyncMemoizer` (enabled by default)
//! - `derive`: the `#[memoized]` attribute (enabled by default)
//! - `fxhash`: hash cache keys with `rustc-hash`
//! - `ahash`: hash cache keys with `ahash`
//! - `full`: `sync` and `derive`
//!
//! ## Example
//!
//! ```rust
//! use memokit::prelude::*;
//!
//! let mut add = memoize(|(left, right): (i32, i32)| left + right);
//!
//! assert_eq!(add.call((1, 2)).unwrap(), 3);
//! assert_eq!(add.call((1, 2)).unwrap(), 3); // served from the cache
//! assert_eq!(add.call((2, 1)).unwrap(), 3); // argument order matters
//! assert_eq!(add.stats().misses, 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and functions.
///
/// # Usage
///
/// ```rust
/// use memokit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{KeyError, MemoizeError};
    pub use crate::key::{ArityPolicy, CacheKey, KeyStrategy};
    pub use crate::memoize::{
        CacheStats, MemoCache, Memoizer, MemoizerBuilder, Recur, RecursiveMemoizer, memoize,
        memoize_recursive, memoize_with, try_memoize, try_memoize_with,
    };

    #[cfg(feature = "sync")]
    pub use crate::memoize::SyncMemoizer;

    #[cfg(feature = "derive")]
    pub use crate::memoized;
}

pub mod error;
pub mod key;
pub mod memoize;

#[cfg(feature = "derive")]
pub use memokit_derive::memoized;

#[doc(hidden)]
pub mod __private {
    pub use crate::memoize::local::{
        Fallible, LocalCache, local_cache, local_len, resolve_local, resolve_local_fallible,
    };
}
