//! Order-independent serialization for unordered collections.
//!
//! Sequences keep their iteration order in a structural key. That is right
//! for `Vec` and `BTreeSet`, but a `HashSet` iterates in an order that
//! depends on its hasher, so two equal sets can produce different keys.
//! [`sorted_set`] serializes the elements in canonical order instead.

use serde::ser::{Error as _, Serialize, Serializer};

use super::serializer::to_canonical;

/// Serializes a collection with its elements sorted by canonical content.
///
/// Use it on unordered fields with `#[serde(serialize_with = ...)]` so that
/// equal sets always give equal structural keys. The elements only need
/// `Serialize`; they are ordered by their canonical tree, not by `Ord`.
///
/// # Errors
///
/// Returns `S::Error` if an element cannot be serialized.
///
/// # Examples
///
/// ```rust
/// use memokit::key::KeyStrategy;
/// use serde::Serialize;
/// use std::collections::HashSet;
///
/// #[derive(Serialize)]
/// struct Query {
///     #[serde(serialize_with = "memokit::key::sorted_set")]
///     tags: HashSet<String>,
/// }
///
/// let forward = Query { tags: ["a", "b", "c"].map(String::from).into() };
/// let backward = Query { tags: ["c", "b", "a"].map(String::from).into() };
/// assert_eq!(
///     KeyStrategy::Structural.derive(&forward).unwrap(),
///     KeyStrategy::Structural.derive(&backward).unwrap()
/// );
/// ```
pub fn sorted_set<'a, C, T, S>(collection: &'a C, serializer: S) -> Result<S::Ok, S::Error>
where
    &'a C: IntoIterator<Item = &'a T>,
    T: Serialize + 'a,
    S: Serializer,
{
    let mut elements = collection
        .into_iter()
        .map(|element| to_canonical(element).map(|canonical| (canonical, element)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(S::Error::custom)?;
    elements.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));
    serializer.collect_seq(elements.into_iter().map(|(_, element)| element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Derivation, KeyStrategy};
    use rstest::rstest;
    use serde::Serialize;
    use std::collections::{BTreeSet, HashSet};

    #[derive(Serialize)]
    struct Members {
        #[serde(serialize_with = "sorted_set")]
        ids: HashSet<u32>,
    }

    fn structural<T: Serialize>(value: &T) -> Derivation {
        KeyStrategy::Structural.derive(value).unwrap()
    }

    #[rstest]
    fn test_equal_sets_give_equal_keys() {
        let forward = Members {
            ids: (0..64).collect(),
        };
        let backward = Members {
            ids: (0..64).rev().collect(),
        };
        assert_eq!(structural(&forward), structural(&backward));
    }

    #[rstest]
    fn test_sorted_set_matches_btree_set_order() {
        let hashed = Members {
            ids: [30, 1, 200].into(),
        };
        let ordered: BTreeSet<u32> = [30, 1, 200].into();
        assert_eq!(
            to_canonical(&hashed).unwrap().to_string(),
            format!("Members{{ids:{}}}", to_canonical(&ordered).unwrap())
        );
    }

    #[rstest]
    fn test_sequence_order_is_content() {
        assert_ne!(structural(&vec![1, 2]), structural(&vec![2, 1]));
    }
}
