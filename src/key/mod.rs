//! Cache-key derivation.
//!
//! A memoizer never hashes its arguments directly. It first derives a
//! [`CacheKey`] with the [`KeyStrategy`] it was built with:
//!
//! - [`KeyStrategy::SinglePrimitive`]: the key is the single primitive
//!   argument (number, string, char or boolean). Other argument shapes are
//!   handled by an explicit [`ArityPolicy`].
//! - [`KeyStrategy::Structural`]: the key is a canonical string encoding
//!   of the whole argument sequence. Different content always gives
//!   different keys, and equal content gives equal keys as long as the
//!   `Serialize` output does not depend on anything but content.
//!
//! Maps are sorted, so every kind of map is order-independent. Sequences
//! keep their iteration order, which is content for a `Vec` but not for a
//! `HashSet`. Pass unordered sets as `BTreeSet`, or serialize them with
//! [`sorted_set`].
//!
//! Arguments are a single `Serialize` value. Tuples are argument
//! sequences, `()` is the empty sequence, and any other value is one
//! argument.
//!
//! # Examples
//!
//! ```rust
//! use memokit::key::{CacheKey, Derivation, KeyStrategy};
//! use std::collections::HashMap;
//!
//! let mut weights = HashMap::new();
//! weights.insert("b", 2);
//! weights.insert("a", 1);
//!
//! let key = KeyStrategy::Structural.derive(&(weights, vec![1.5])).unwrap();
//! assert_eq!(
//!     key,
//!     Derivation::Cached(CacheKey::Structural(r#"({"a":1,"b":2},[1.5])"#.to_string()))
//! );
//! ```

mod canonical;
mod serializer;
mod strategy;
mod unordered;

pub use canonical::Canonical;
pub use serializer::{CanonicalSerializer, to_canonical};
pub use strategy::{ArityPolicy, CacheKey, Derivation, KeyStrategy, PrimitiveKey};
pub use unordered::sorted_set;
