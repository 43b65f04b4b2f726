//! Key derivation strategies.

use std::fmt;

use serde::Serialize;

use super::canonical::Canonical;
use super::serializer::to_canonical;
use crate::error::KeyError;

/// What to do when the single-primitive strategy is given arguments it cannot key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArityPolicy {
    /// Fail with [`KeyError::ArityMismatch`] or [`KeyError::NotPrimitive`].
    #[default]
    Reject,
    /// Skip the cache and invoke the function directly. Nothing is stored.
    Bypass,
}

/// How a memoizer turns call arguments into a [`CacheKey`].
///
/// The strategy is chosen once, when the memoizer is built, and never
/// inferred from the arguments of a particular call.
///
/// # Examples
///
/// ```rust
/// use memokit::key::{ArityPolicy, CacheKey, Derivation, KeyStrategy, PrimitiveKey};
///
/// let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Bypass);
/// assert_eq!(
///     strategy.derive(&42_u32).unwrap(),
///     Derivation::Cached(CacheKey::Primitive(PrimitiveKey::Integer(42)))
/// );
/// assert_eq!(strategy.derive(&(1, 2)).unwrap(), Derivation::Bypass);
///
/// let structural = KeyStrategy::Structural;
/// assert_eq!(
///     structural.derive(&(1, 2)).unwrap(),
///     Derivation::Cached(CacheKey::Structural("(1,2)".to_string()))
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyStrategy {
    /// The key is the single primitive argument itself.
    ///
    /// Valid only for exactly one argument that is a number, string, char
    /// or boolean. Anything else is handled by the [`ArityPolicy`].
    SinglePrimitive(ArityPolicy),
    /// The key is the canonical encoding of the whole argument sequence.
    ///
    /// Map entries are sorted, but sequence elements keep their iteration
    /// order. Equal `HashSet`s may therefore give different keys unless
    /// they are serialized with [`sorted_set`](super::sorted_set) or passed
    /// as `BTreeSet`.
    #[default]
    Structural,
}

/// A primitive cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKey {
    /// A boolean argument.
    Bool(bool),
    /// An integer argument that fits in `i128`.
    Integer(i128),
    /// An unsigned integer argument above `i128::MAX`.
    Unsigned(u128),
    /// A float argument, as normalised `f64` bits.
    Float(u64),
    /// A string or char argument.
    Text(String),
}

impl fmt::Display for PrimitiveKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Integer(value) => write!(formatter, "{value}"),
            Self::Unsigned(value) => write!(formatter, "{value}"),
            Self::Float(bits) => write!(formatter, "{:?}", f64::from_bits(*bits)),
            Self::Text(value) => write!(formatter, "{value:?}"),
        }
    }
}

/// A derived cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Produced by [`KeyStrategy::SinglePrimitive`].
    Primitive(PrimitiveKey),
    /// Produced by [`KeyStrategy::Structural`].
    Structural(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(key) => write!(formatter, "{key}"),
            Self::Structural(key) => formatter.write_str(key),
        }
    }
}

/// The outcome of deriving a key for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Look the call up under this key.
    Cached(CacheKey),
    /// Do not consult the cache for this call.
    Bypass,
}

impl KeyStrategy {
    /// Returns the same strategy with a [`ArityPolicy::Reject`] policy.
    #[must_use]
    pub const fn strict(self) -> Self {
        match self {
            Self::SinglePrimitive(_) => Self::SinglePrimitive(ArityPolicy::Reject),
            Self::Structural => Self::Structural,
        }
    }

    /// Derives the key for `arguments`.
    ///
    /// # Errors
    ///
    /// - [`KeyError::Unserializable`] if the arguments cannot be serialized.
    ///   This is reported under every strategy and policy.
    /// - [`KeyError::ArityMismatch`] / [`KeyError::NotPrimitive`] under
    ///   `SinglePrimitive(ArityPolicy::Reject)`.
    pub fn derive<A>(self, arguments: &A) -> Result<Derivation, KeyError>
    where
        A: Serialize + ?Sized,
    {
        let tree = to_canonical(arguments)?;
        match self {
            Self::Structural => Ok(Derivation::Cached(CacheKey::Structural(
                tree.to_string(),
            ))),
            Self::SinglePrimitive(policy) => match primitive_key(&tree) {
                Ok(key) => Ok(Derivation::Cached(CacheKey::Primitive(key))),
                Err(_) if policy == ArityPolicy::Bypass => Ok(Derivation::Bypass),
                Err(error) => Err(error),
            },
        }
    }

    /// Derives the key for `arguments`, treating a bypass as an error.
    ///
    /// Used where a value must be stored, such as seeding a cache.
    ///
    /// # Errors
    ///
    /// Same as [`derive`](Self::derive) under the [`strict`](Self::strict) policy.
    pub fn derive_strict<A>(self, arguments: &A) -> Result<CacheKey, KeyError>
    where
        A: Serialize + ?Sized,
    {
        match self.strict().derive(arguments)? {
            Derivation::Cached(key) => Ok(key),
            // A strict strategy never bypasses.
            Derivation::Bypass => Err(KeyError::ArityMismatch { found: 0 }),
        }
    }
}

fn primitive_key(tree: &Canonical) -> Result<PrimitiveKey, KeyError> {
    let [argument] = tree.arguments() else {
        return Err(KeyError::ArityMismatch {
            found: tree.arguments().len(),
        });
    };
    match argument {
        Canonical::Bool(value) => Ok(PrimitiveKey::Bool(*value)),
        Canonical::Integer(value) => Ok(PrimitiveKey::Integer(*value)),
        Canonical::Unsigned(value) => Ok(PrimitiveKey::Unsigned(*value)),
        Canonical::Float(bits) => Ok(PrimitiveKey::Float(*bits)),
        Canonical::Text(value) => Ok(PrimitiveKey::Text(value.clone())),
        Canonical::Char(value) => Ok(PrimitiveKey::Text(value.to_string())),
        other => Err(KeyError::NotPrimitive {
            found: other.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, PrimitiveKey::Bool(true))]
    fn test_primitive_bool(#[case] argument: bool, #[case] expected: PrimitiveKey) {
        let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Reject);
        assert_eq!(
            strategy.derive(&argument).unwrap(),
            Derivation::Cached(CacheKey::Primitive(expected))
        );
    }

    #[rstest]
    fn test_primitive_accepts_one_element_tuple() {
        let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Reject);
        assert_eq!(
            strategy.derive(&("abc",)).unwrap(),
            strategy.derive("abc").unwrap()
        );
    }

    #[rstest]
    fn test_primitive_char_and_string_share_key() {
        let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Reject);
        assert_eq!(
            strategy.derive(&'x').unwrap(),
            strategy.derive("x").unwrap()
        );
    }

    #[rstest]
    #[case::unit(KeyStrategy::SinglePrimitive(ArityPolicy::Reject).derive(&()), 0)]
    #[case::pair(KeyStrategy::SinglePrimitive(ArityPolicy::Reject).derive(&(1, 2)), 2)]
    #[case::triple(KeyStrategy::SinglePrimitive(ArityPolicy::Reject).derive(&(1, "a", true)), 3)]
    fn test_primitive_rejects_arity(
        #[case] result: Result<Derivation, KeyError>,
        #[case] found: usize,
    ) {
        assert_eq!(result, Err(KeyError::ArityMismatch { found }));
    }

    #[rstest]
    fn test_primitive_rejects_structured_argument() {
        let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Reject);
        assert_eq!(
            strategy.derive(&vec![1, 2, 3]),
            Err(KeyError::NotPrimitive { found: "sequence" })
        );
        assert_eq!(
            strategy.derive(&Some(1)),
            Err(KeyError::NotPrimitive { found: "option" })
        );
    }

    #[rstest]
    fn test_bypass_policy_never_errors_on_shape() {
        let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Bypass);
        assert_eq!(strategy.derive(&()).unwrap(), Derivation::Bypass);
        assert_eq!(strategy.derive(&vec![1]).unwrap(), Derivation::Bypass);
    }

    #[rstest]
    fn test_structural_key_depends_on_order() {
        let strategy = KeyStrategy::Structural;
        assert_ne!(
            strategy.derive(&(1, 2)).unwrap(),
            strategy.derive(&(2, 1)).unwrap()
        );
    }

    #[rstest]
    fn test_structural_and_primitive_keys_never_collide() {
        let primitive = KeyStrategy::SinglePrimitive(ArityPolicy::Reject)
            .derive_strict(&1)
            .unwrap();
        let structural = KeyStrategy::Structural.derive_strict(&1).unwrap();
        assert_ne!(primitive, structural);
        assert_eq!(primitive.to_string(), structural.to_string());
    }

    #[rstest]
    fn test_strict_overrides_bypass() {
        let strategy = KeyStrategy::SinglePrimitive(ArityPolicy::Bypass);
        assert_eq!(
            strategy.derive_strict(&(1, 2)),
            Err(KeyError::ArityMismatch { found: 2 })
        );
        assert_eq!(KeyStrategy::Structural.strict(), KeyStrategy::Structural);
    }

    #[rstest]
    fn test_default_strategy_is_structural() {
        assert_eq!(KeyStrategy::default(), KeyStrategy::Structural);
        assert_eq!(ArityPolicy::default(), ArityPolicy::Reject);
    }
}
