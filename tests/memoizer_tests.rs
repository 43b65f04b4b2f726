//! Unit tests for Memoizer.
//!
//! Tests cover:
//! - Caching of repeated calls
//! - Cache isolation between instances
//! - Argument order and structural keys
//! - Failed computations are never cached
//! - Single-primitive strategy policies
//! - Wrapping only the outer call of a recursive function

use memokit::error::{KeyError, MemoizeError};
use memokit::key::{ArityPolicy, CacheKey, KeyStrategy, PrimitiveKey};
use memokit::memoize::{CacheStats, Memoizer, memoize, memoize_with, try_memoize, try_memoize_with};
use rstest::rstest;
use serde::Serialize;
use std::cell::Cell;

// =============================================================================
// Basic Caching
// =============================================================================

#[rstest]
fn memoizer_doubles_and_counts_invocations() {
    let invocations = Cell::new(0);
    let mut double = memoize(|n: i64| {
        invocations.set(invocations.get() + 1);
        n * 2
    });

    assert_eq!(double.call(5).unwrap(), 10);
    assert_eq!(invocations.get(), 1);

    assert_eq!(double.call(5).unwrap(), 10);
    assert_eq!(invocations.get(), 1);

    assert_eq!(double.call(6).unwrap(), 12);
    assert_eq!(invocations.get(), 2);
}

#[rstest]
fn memoizer_starts_empty_and_defers_computation() {
    let invocations = Cell::new(0);
    let double = memoize(|n: i64| {
        invocations.set(invocations.get() + 1);
        n * 2
    });

    assert!(double.is_empty());
    assert_eq!(double.len(), 0);
    assert_eq!(invocations.get(), 0);
    assert_eq!(double.stats(), CacheStats::default());
}

#[rstest]
fn memoizer_returns_clones_of_cached_values() {
    let mut words = memoize(|count: usize| vec!["word".to_string(); count]);

    let mut first = words.call(3).unwrap();
    first.push("mutated".to_string());

    let second = words.call(3).unwrap();
    assert_eq!(second, vec!["word".to_string(); 3]);
}

#[rstest]
fn memoizer_with_no_arguments() {
    let invocations = Cell::new(0);
    let mut constant = memoize(|(): ()| {
        invocations.set(invocations.get() + 1);
        "configuration"
    });

    assert_eq!(constant.call(()).unwrap(), "configuration");
    assert_eq!(constant.call(()).unwrap(), "configuration");
    assert_eq!(invocations.get(), 1);
    assert_eq!(constant.contains(&()), Ok(true));
}

#[rstest]
fn memoizer_stats_track_hits_and_misses() {
    let mut square = memoize(|n: u32| n * n);
    for n in [1, 2, 1, 1, 3, 2] {
        square.call(n).unwrap();
    }

    assert_eq!(
        square.stats(),
        CacheStats {
            hits: 3,
            misses: 3,
            bypasses: 0,
            failures: 0
        }
    );
    assert!((square.stats().hit_ratio() - 0.5).abs() < f64::EPSILON);
}

// =============================================================================
// Cache Isolation
// =============================================================================

#[rstest]
fn memoizers_wrapping_the_same_function_do_not_share_entries() {
    fn triple(n: i32) -> i32 {
        n * 3
    }

    let mut first = memoize(triple);
    let second = memoize(triple);

    first.call(7).unwrap();
    first.call(8).unwrap();

    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
    assert_eq!(second.contains(&7), Ok(false));
}

#[rstest]
fn colliding_keys_in_different_memoizers_stay_independent() {
    let mut length = memoize(|text: String| text.len());
    let mut shout = memoize(|text: String| text.to_uppercase());

    assert_eq!(length.call("abc".to_string()).unwrap(), 3);
    assert_eq!(shout.call("abc".to_string()).unwrap(), "ABC");
    assert_eq!(length.call("abc".to_string()).unwrap(), 3);
}

// =============================================================================
// Structural Keys
// =============================================================================

#[rstest]
fn two_argument_calls_share_one_entry() {
    let invocations = Cell::new(0);
    let mut add = memoize(|(left, right): (i32, i32)| {
        invocations.set(invocations.get() + 1);
        left + right
    });

    assert_eq!(add.call((1, 2)).unwrap(), 3);
    assert_eq!(add.call((1, 2)).unwrap(), 3);
    assert_eq!(invocations.get(), 1);
    assert_eq!(add.len(), 1);

    assert_eq!(add.call((2, 1)).unwrap(), 3);
    assert_eq!(invocations.get(), 2);
    assert_eq!(add.len(), 2);
}

#[rstest]
fn freshly_built_equal_arguments_hit_the_cache() {
    #[derive(Serialize)]
    struct Query {
        table: String,
        columns: Vec<String>,
        limit: Option<u32>,
    }

    let build = || Query {
        table: "users".to_string(),
        columns: vec!["id".to_string(), "name".to_string()],
        limit: Some(10),
    };

    let invocations = Cell::new(0);
    let mut render = memoize(|query: Query| {
        invocations.set(invocations.get() + 1);
        format!("{} {}", query.table, query.columns.join(","))
    });

    assert_eq!(render.call(build()).unwrap(), "users id,name");
    assert_eq!(render.call(build()).unwrap(), "users id,name");
    assert_eq!(invocations.get(), 1);

    let mut changed = build();
    changed.limit = None;
    render.call(changed).unwrap();
    assert_eq!(invocations.get(), 2);
}

#[rstest]
fn json_arguments_with_equal_content_share_one_entry() {
    let invocations = Cell::new(0);
    let mut size = memoize(|value: serde_json::Value| {
        invocations.set(invocations.get() + 1);
        value.to_string().len()
    });

    size.call(serde_json::json!([1, {"a": 2}])).unwrap();
    size.call(serde_json::json!([1, {"a": 2}])).unwrap();
    assert_eq!(invocations.get(), 1);

    size.call(serde_json::json!([1, {"a": 3}])).unwrap();
    assert_eq!(invocations.get(), 2);
}

#[rstest]
fn borrowed_and_owned_arguments_produce_the_same_key() {
    let mut owned = memoize(|text: String| text.len());
    let mut borrowed = memoize(|text: &str| text.len());

    owned.call("same".to_string()).unwrap();
    borrowed.call("same").unwrap();

    let owned_keys: Vec<_> = owned.cache().keys().cloned().collect();
    let borrowed_keys: Vec<_> = borrowed.cache().keys().cloned().collect();
    assert_eq!(owned_keys, borrowed_keys);
}

// =============================================================================
// Failed Computations
// =============================================================================

#[rstest]
fn always_failing_function_is_invoked_on_every_call() {
    let invocations = Cell::new(0);
    let mut boom = try_memoize(|(): ()| -> Result<i32, String> {
        invocations.set(invocations.get() + 1);
        Err("boom".to_string())
    });

    let first = boom.call(()).unwrap_err();
    assert_eq!(first, MemoizeError::Compute("boom".to_string()));
    assert_eq!(invocations.get(), 1);

    let second = boom.call(()).unwrap_err();
    assert_eq!(second, MemoizeError::Compute("boom".to_string()));
    assert_eq!(invocations.get(), 2);

    assert!(boom.is_empty());
    assert_eq!(boom.stats().failures, 2);
}

#[rstest]
fn failure_is_retried_and_success_is_then_cached() {
    let invocations = Cell::new(0);
    let mut flaky = try_memoize(|n: u32| {
        invocations.set(invocations.get() + 1);
        if invocations.get() == 1 {
            Err("transient")
        } else {
            Ok(n * 10)
        }
    });

    assert!(flaky.call(4).unwrap_err().is_compute());
    assert_eq!(flaky.call(4).unwrap(), 40);
    assert_eq!(flaky.call(4).unwrap(), 40);
    assert_eq!(invocations.get(), 2);
}

#[rstest]
fn compute_and_key_errors_are_distinguishable() {
    struct Handle;

    impl Serialize for Handle {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("handles have no stable content"))
        }
    }

    let mut open = try_memoize(|(_handle, path): (Handle, String)| -> Result<usize, &'static str> {
        if path.is_empty() { Err("empty path") } else { Ok(path.len()) }
    });

    let error = open.call((Handle, "a".to_string())).unwrap_err();
    assert!(error.is_key());
    assert_eq!(
        error,
        MemoizeError::Key(KeyError::Unserializable {
            reason: "handles have no stable content".to_string()
        })
    );
    assert_eq!(open.stats().calls(), 0);
}

// =============================================================================
// Single-Primitive Strategy
// =============================================================================

#[rstest]
fn single_primitive_uses_the_argument_as_key() {
    let mut negate = memoize_with(
        |flag: bool| !flag,
        KeyStrategy::SinglePrimitive(ArityPolicy::Reject),
    );
    negate.call(true).unwrap();

    let keys: Vec<_> = negate.cache().keys().cloned().collect();
    assert_eq!(keys, vec![CacheKey::Primitive(PrimitiveKey::Bool(true))]);
}

#[rstest]
#[case::reject(ArityPolicy::Reject)]
#[case::bypass(ArityPolicy::Bypass)]
fn single_primitive_caches_unary_primitive_calls(#[case] policy: ArityPolicy) {
    let invocations = Cell::new(0);
    let mut length = memoize_with(
        |text: &str| {
            invocations.set(invocations.get() + 1);
            text.chars().count()
        },
        KeyStrategy::SinglePrimitive(policy),
    );

    assert_eq!(length.call("héllo").unwrap(), 5);
    assert_eq!(length.call("héllo").unwrap(), 5);
    assert_eq!(invocations.get(), 1);
}

#[rstest]
fn reject_policy_fails_fast_on_multiple_arguments() {
    let invocations = Cell::new(0);
    let mut add = try_memoize_with(
        |(left, right): (i32, i32)| {
            invocations.set(invocations.get() + 1);
            Ok::<_, ()>(left + right)
        },
        KeyStrategy::SinglePrimitive(ArityPolicy::Reject),
    );

    assert_eq!(
        add.call((1, 2)),
        Err(MemoizeError::Key(KeyError::ArityMismatch { found: 2 }))
    );
    assert_eq!(invocations.get(), 0);
}

#[rstest]
fn reject_policy_fails_fast_on_structured_argument() {
    let mut total = memoize_with(
        |values: Vec<u8>| values.iter().map(|value| u32::from(*value)).sum::<u32>(),
        KeyStrategy::SinglePrimitive(ArityPolicy::Reject),
    );

    assert_eq!(
        total.call(vec![1, 2]),
        Err(MemoizeError::Key(KeyError::NotPrimitive { found: "sequence" }))
    );
}

#[rstest]
fn bypass_policy_always_invokes_the_function() {
    let invocations = Cell::new(0);
    let mut add = memoize_with(
        |(left, right): (i32, i32)| {
            invocations.set(invocations.get() + 1);
            left + right
        },
        KeyStrategy::SinglePrimitive(ArityPolicy::Bypass),
    );

    assert_eq!(add.call((1, 2)).unwrap(), 3);
    assert_eq!(add.call((1, 2)).unwrap(), 3);
    assert_eq!(invocations.get(), 2);
    assert!(add.is_empty());
    assert_eq!(add.stats().bypasses, 2);
}

#[rstest]
fn bypassed_failures_are_counted() {
    let mut failing = try_memoize_with(
        |(_left, _right): (i32, i32)| Err::<i32, _>("nope"),
        KeyStrategy::SinglePrimitive(ArityPolicy::Bypass),
    );

    assert!(failing.call((1, 2)).unwrap_err().is_compute());
    assert_eq!(failing.stats().bypasses, 1);
    assert_eq!(failing.stats().failures, 1);
}

// =============================================================================
// Recursive Functions Wrapped Only At The Outer Call
// =============================================================================

fn naive_fibonacci(n: u64, evaluations: &Cell<u64>) -> u64 {
    evaluations.set(evaluations.get() + 1);
    if n < 2 {
        n
    } else {
        naive_fibonacci(n - 1, evaluations) + naive_fibonacci(n - 2, evaluations)
    }
}

#[rstest]
fn wrapping_the_outer_call_does_not_memoize_inner_calls() {
    let evaluations = Cell::new(0);
    let mut fibonacci = memoize(|n: u64| naive_fibonacci(n, &evaluations));

    assert_eq!(fibonacci.call(10).unwrap(), 55);
    // every inner call still runs: 177 evaluations for fib(10)
    assert_eq!(evaluations.get(), 177);

    // only the outer call is cached
    assert_eq!(fibonacci.call(10).unwrap(), 55);
    assert_eq!(evaluations.get(), 177);
    assert_eq!(fibonacci.call(9).unwrap(), 34);
    assert_eq!(evaluations.get(), 177 + 109);
}

// =============================================================================
// Inspection
// =============================================================================

#[rstest]
fn into_cache_returns_all_results() {
    let mut square = memoize(|n: i32| n * n);
    for n in 1..=4 {
        square.call(n).unwrap();
    }

    let mut values: Vec<_> = square.into_cache().into_iter().map(|(_, value)| value).collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 4, 9, 16]);
}

#[rstest]
fn strategy_is_reported() {
    let structural = Memoizer::new(|n: u8| Ok::<_, ()>(n));
    assert_eq!(structural.strategy(), KeyStrategy::Structural);

    let primitive = Memoizer::with_strategy(
        |n: u8| Ok::<_, ()>(n),
        KeyStrategy::SinglePrimitive(ArityPolicy::Bypass),
    );
    assert_eq!(
        primitive.strategy(),
        KeyStrategy::SinglePrimitive(ArityPolicy::Bypass)
    );
}
