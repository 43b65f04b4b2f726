//! Procedural macros for memokit.
//!
//! # Available Attribute Macros
//!
//! - [`macro@memoized`]: Memoizes a free function, recursive calls included
//!
//! # Example
//!
//! ```rust,ignore
//! use memokit::memoized;
//!
//! #[memoized]
//! fn fibonacci(n: u64) -> u64 {
//!     if n < 2 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
//! }
//!
//! assert_eq!(fibonacci(90), 2_880_067_194_370_816_120);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod memoized;

use proc_macro::TokenStream;

/// Memoizes a function behind a per-thread cache.
///
/// The body runs at most once per distinct argument tuple on each thread;
/// later calls return a clone of the stored result. Keys are derived with
/// the structural strategy from all arguments together, so argument order
/// matters and equal content always hits the same entry.
///
/// Recursive calls in the body name the function itself, and after the
/// rewrite that name refers to the memoized function. Every level of the
/// recursion therefore shares the cache without any extra wiring.
///
/// # Requirements
///
/// - Every argument type implements `serde::Serialize`
/// - The return type implements `Clone` and is `'static`
/// - The function is not `async`, `const`, generic or a method taking `self`
/// - Neither the arguments nor the return type use `impl Trait`
/// - The body of an associated function does not refer to `Self`
///
/// Argument patterns such as `(x, y): (i32, i32)` are supported.
///
/// # Fallible Functions
///
/// When the return type's last path segment is `Result` (`Result<T, E>`,
/// `std::io::Result<T>` and similar aliases), only `Ok` values are cached.
/// An `Err` is returned unchanged and the next call with the same
/// arguments runs the body again. In that case only `T` needs `Clone`.
///
/// # Panics
///
/// The generated function panics if its arguments cannot be keyed, which
/// happens only when an argument's `Serialize` implementation fails.
///
/// # Example
///
/// ```rust,ignore
/// use memokit::memoized;
///
/// #[memoized]
/// fn grid_paths(width: u32, height: u32) -> u64 {
///     if width == 0 || height == 0 {
///         1
///     } else {
///         grid_paths(width - 1, height) + grid_paths(width, height - 1)
///     }
/// }
///
/// assert_eq!(grid_paths(16, 16), 601_080_390);
/// ```
#[proc_macro_attribute]
pub fn memoized(attribute: TokenStream, item: TokenStream) -> TokenStream {
    memoized::memoized_impl(attribute, item)
}
