//! Error types for memoized calls.
//!
//! A memoized call can fail for two unrelated reasons: the wrapped function
//! itself failed, or the memoizer could not turn the arguments into a cache
//! key. The two are kept apart so callers can tell "your function failed"
//! from "these arguments cannot be keyed".

use std::fmt;

/// Represents a failure to derive a cache key from call arguments.
///
/// # Examples
///
/// ```rust
/// use memokit::error::KeyError;
///
/// let error = KeyError::ArityMismatch { found: 2 };
/// assert_eq!(
///     error.to_string(),
///     "cannot derive cache key: single-primitive strategy expects exactly 1 argument, found 2"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The arguments could not be encoded structurally.
    ///
    /// Produced when a `Serialize` implementation reports an error, which is
    /// how values that have no stable content (handles, callbacks, cyclic
    /// graphs) refuse to be keyed.
    Unserializable {
        /// The message reported by the failing `Serialize` implementation.
        reason: String,
    },
    /// The single-primitive strategy was given a number of arguments other than one.
    ArityMismatch {
        /// The number of arguments that were supplied.
        found: usize,
    },
    /// The single-primitive strategy was given one argument that is not a primitive.
    NotPrimitive {
        /// The kind of value that was supplied (for example `"sequence"`).
        found: &'static str,
    },
}

impl fmt::Display for KeyError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unserializable { reason } => {
                write!(formatter, "cannot derive cache key: {reason}")
            }
            Self::ArityMismatch { found } => write!(
                formatter,
                "cannot derive cache key: single-primitive strategy expects exactly 1 argument, found {found}"
            ),
            Self::NotPrimitive { found } => write!(
                formatter,
                "cannot derive cache key: single-primitive strategy expects a number, string or boolean, found {found}"
            ),
        }
    }
}

impl std::error::Error for KeyError {}

impl serde::ser::Error for KeyError {
    fn custom<T: fmt::Display>(message: T) -> Self {
        Self::Unserializable {
            reason: message.to_string(),
        }
    }
}

/// The error returned by a memoized call.
///
/// # Examples
///
/// ```rust
/// use memokit::error::{KeyError, MemoizeError};
///
/// let failed: MemoizeError<&str> = MemoizeError::Compute("boom");
/// assert!(failed.is_compute());
/// assert_eq!(failed.to_string(), "boom");
///
/// let unkeyed: MemoizeError<&str> = KeyError::ArityMismatch { found: 0 }.into();
/// assert!(unkeyed.is_key());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoizeError<E> {
    /// The wrapped function returned an error. Nothing was cached.
    Compute(E),
    /// The arguments could not be turned into a cache key.
    /// The wrapped function was not invoked.
    Key(KeyError),
}

impl<E> MemoizeError<E> {
    /// Wraps an error produced by the memoized function.
    ///
    /// Useful inside recursive functions, which must report their own
    /// failures in the same type as failures of their recursive steps.
    #[inline]
    pub const fn compute(error: E) -> Self {
        Self::Compute(error)
    }

    /// Returns `true` if the wrapped function failed.
    #[inline]
    pub const fn is_compute(&self) -> bool {
        matches!(self, Self::Compute(_))
    }

    /// Returns `true` if the arguments could not be keyed.
    #[inline]
    pub const fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// Returns a reference to the function's error, if that is what failed.
    #[inline]
    pub const fn compute_error(&self) -> Option<&E> {
        match self {
            Self::Compute(error) => Some(error),
            Self::Key(_) => None,
        }
    }

    /// Consumes the error and returns the function's error, if that is what failed.
    #[inline]
    pub fn into_compute(self) -> Option<E> {
        match self {
            Self::Compute(error) => Some(error),
            Self::Key(_) => None,
        }
    }

    /// Maps the function's error with `function`, leaving key errors untouched.
    pub fn map_compute<F, G>(self, function: G) -> MemoizeError<F>
    where
        G: FnOnce(E) -> F,
    {
        match self {
            Self::Compute(error) => MemoizeError::Compute(function(error)),
            Self::Key(error) => MemoizeError::Key(error),
        }
    }
}

impl<E> From<KeyError> for MemoizeError<E> {
    fn from(error: KeyError) -> Self {
        Self::Key(error)
    }
}

impl<E: fmt::Display> fmt::Display for MemoizeError<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute(error) => write!(formatter, "{error}"),
            Self::Key(error) => write!(formatter, "{error}"),
        }
    }
}

impl<E> std::error::Error for MemoizeError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compute(error) => Some(error),
            Self::Key(error) => Some(error),
        }
    }
}

static_assertions::assert_impl_all!(KeyError: Send, Sync, std::error::Error);
static_assertions::assert_impl_all!(MemoizeError<std::io::Error>: Send, Sync, std::error::Error);
