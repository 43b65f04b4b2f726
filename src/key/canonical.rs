//! Canonical, content-only representation of call arguments.
//!
//! Arguments are first serialized into a [`Canonical`] tree and then
//! rendered into a string. The tree forgets integer widths, reference
//! identity and the iteration order of maps. Sequences keep the order in
//! which they were serialized, so a `HashSet` argument needs
//! [`sorted_set`](super::sorted_set) to be order-independent.
//! The rendering is injective, so two trees render identically exactly when
//! they are equal.

use std::fmt;

/// Bit pattern used for every NaN, so all NaNs share one key.
const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// A canonical argument tree.
///
/// Built by [`to_canonical`](super::to_canonical); compared and rendered to
/// produce structural cache keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Canonical {
    /// The unit value `()`, also used for unit structs.
    Unit,
    /// A boolean.
    Bool(bool),
    /// Any integer that fits in `i128`, regardless of its original width.
    Integer(i128),
    /// An unsigned integer above `i128::MAX`.
    Unsigned(u128),
    /// A float, stored as normalised `f64` bits.
    Float(u64),
    /// A single character.
    Char(char),
    /// A string.
    Text(String),
    /// A byte string.
    Bytes(Vec<u8>),
    /// `None`.
    Absent,
    /// `Some(value)`.
    Present(Box<Self>),
    /// A variable-length sequence such as `Vec<T>` or a set.
    Sequence(Vec<Self>),
    /// A fixed-length tuple or array.
    Tuple(Vec<Self>),
    /// A map, entries sorted by key.
    Map(Vec<(Self, Self)>),
    /// A named wrapper such as `struct Meters(f64)`.
    Newtype {
        /// The type name.
        name: &'static str,
        /// The wrapped value.
        value: Box<Self>,
    },
    /// A tuple struct such as `struct Point(i32, i32)`.
    TupleStruct {
        /// The type name.
        name: &'static str,
        /// The fields in declaration order.
        fields: Vec<Self>,
    },
    /// A struct with named fields, in declaration order.
    Struct {
        /// The type name.
        name: &'static str,
        /// The fields in declaration order.
        fields: Vec<(&'static str, Self)>,
    },
    /// An enum variant. Unit variants carry [`Canonical::Unit`] as payload.
    Variant {
        /// The enum name.
        name: &'static str,
        /// The variant name.
        variant: &'static str,
        /// The variant payload.
        payload: Box<Self>,
    },
}

impl Canonical {
    /// Builds a float node, folding `-0.0` into `0.0` and every NaN into one NaN.
    pub fn float(value: f64) -> Self {
        let bits = if value.is_nan() {
            CANONICAL_NAN_BITS
        } else if value == 0.0 {
            0.0_f64.to_bits()
        } else {
            value.to_bits()
        };
        Self::Float(bits)
    }

    /// Builds an integer node from any signed value.
    pub fn signed(value: impl Into<i128>) -> Self {
        Self::Integer(value.into())
    }

    /// Builds an integer node from any unsigned value.
    ///
    /// Values that fit in `i128` share their node with the equal signed
    /// value, so `5_u8` and `5_i64` produce the same key.
    pub fn unsigned(value: impl Into<u128>) -> Self {
        let value = value.into();
        i128::try_from(value).map_or(Self::Unsigned(value), Self::Integer)
    }

    /// Builds a map node from entries in arbitrary order.
    pub fn map(mut entries: Vec<(Self, Self)>) -> Self {
        entries.sort();
        Self::Map(entries)
    }

    /// Returns a short, human readable name of the node kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "boolean",
            Self::Integer(_) | Self::Unsigned(_) => "integer",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Text(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Absent | Self::Present(_) => "option",
            Self::Sequence(_) => "sequence",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Newtype { .. } => "newtype struct",
            Self::TupleStruct { .. } => "tuple struct",
            Self::Struct { .. } => "struct",
            Self::Variant { .. } => "enum variant",
        }
    }

    /// Splits the tree into the argument sequence it stands for.
    ///
    /// A tuple is a sequence of arguments, `()` is no argument, and anything
    /// else is a single argument.
    pub fn arguments(&self) -> &[Self] {
        match self {
            Self::Tuple(items) => items,
            Self::Unit => &[],
            single => std::slice::from_ref(single),
        }
    }
}

fn write_joined(formatter: &mut fmt::Formatter<'_>, items: &[Canonical]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            formatter.write_str(",")?;
        }
        write!(formatter, "{item}")?;
    }
    Ok(())
}

/// A struct, field or variant name. Renamed names that are not plain
/// identifiers are quoted so they cannot pass for content.
struct Label(&'static str);

impl fmt::Display for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut characters = self.0.chars();
        let plain = characters
            .next()
            .is_some_and(|first| first.is_alphabetic() || first == '_')
            && characters.all(|character| character.is_alphanumeric() || character == '_');
        if plain {
            formatter.write_str(self.0)
        } else {
            write!(formatter, "{:?}", self.0)
        }
    }
}

impl fmt::Display for Canonical {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => formatter.write_str("()"),
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Integer(value) => write!(formatter, "{value}"),
            Self::Unsigned(value) => write!(formatter, "{value}"),
            // Debug keeps the decimal point, so 1.0 never renders like the integer 1.
            Self::Float(bits) => write!(formatter, "{:?}", f64::from_bits(*bits)),
            Self::Char(value) => write!(formatter, "{value:?}"),
            Self::Text(value) => write!(formatter, "{value:?}"),
            Self::Bytes(bytes) => {
                formatter.write_str("b\"")?;
                for byte in bytes {
                    write!(formatter, "{byte:02x}")?;
                }
                formatter.write_str("\"")
            }
            Self::Absent => formatter.write_str("None"),
            Self::Present(value) => write!(formatter, "Some({value})"),
            Self::Sequence(items) => {
                formatter.write_str("[")?;
                write_joined(formatter, items)?;
                formatter.write_str("]")
            }
            Self::Tuple(items) => {
                formatter.write_str("(")?;
                write_joined(formatter, items)?;
                if items.len() == 1 {
                    formatter.write_str(",")?;
                }
                formatter.write_str(")")
            }
            Self::Map(entries) => {
                formatter.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(",")?;
                    }
                    write!(formatter, "{key}:{value}")?;
                }
                formatter.write_str("}")
            }
            Self::Newtype { name, value } => write!(formatter, "{}({value})", Label(*name)),
            Self::TupleStruct { name, fields } => {
                write!(formatter, "{}(", Label(*name))?;
                write_joined(formatter, fields)?;
                // `Name(x,)` keeps a one-field tuple struct apart from a newtype.
                if fields.len() == 1 {
                    formatter.write_str(",")?;
                }
                formatter.write_str(")")
            }
            Self::Struct { name, fields } => {
                write!(formatter, "{}{{", Label(*name))?;
                for (index, (field, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(",")?;
                    }
                    write!(formatter, "{}:{value}", Label(*field))?;
                }
                formatter.write_str("}")
            }
            Self::Variant {
                name,
                variant,
                payload,
            } => match payload.as_ref() {
                Self::Unit => write!(formatter, "{}::{}", Label(*name), Label(*variant)),
                payload => write!(formatter, "{}::{}({payload})", Label(*name), Label(*variant)),
            },
        }
    }
}
