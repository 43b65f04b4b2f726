//! A `serde` serializer that builds [`Canonical`] trees.

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant,
};

use super::canonical::Canonical;
use crate::error::KeyError;

/// Serializes `value` into its canonical argument tree.
///
/// # Errors
///
/// Returns [`KeyError::Unserializable`] when the value's `Serialize`
/// implementation fails.
///
/// # Examples
///
/// ```rust
/// use memokit::key::to_canonical;
///
/// let tree = to_canonical(&(1_u8, "two", [3.0_f64])).unwrap();
/// assert_eq!(tree.to_string(), r#"(1,"two",(3.0,))"#);
/// ```
pub fn to_canonical<T>(value: &T) -> Result<Canonical, KeyError>
where
    T: Serialize + ?Sized,
{
    value.serialize(CanonicalSerializer)
}

/// The serializer behind [`to_canonical`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalSerializer;

#[doc(hidden)]
pub enum SequenceKind {
    Sequence,
    Tuple,
    TupleStruct(&'static str),
    TupleVariant(&'static str, &'static str),
}

#[doc(hidden)]
pub struct SequenceCollector {
    kind: SequenceKind,
    items: Vec<Canonical>,
}

impl SequenceCollector {
    fn new(kind: SequenceKind, capacity: Option<usize>) -> Self {
        Self {
            kind,
            items: Vec::with_capacity(capacity.unwrap_or(0)),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), KeyError> {
        self.items.push(to_canonical(value)?);
        Ok(())
    }

    fn finish(self) -> Canonical {
        match self.kind {
            SequenceKind::Sequence => Canonical::Sequence(self.items),
            SequenceKind::Tuple => Canonical::Tuple(self.items),
            SequenceKind::TupleStruct(name) => Canonical::TupleStruct {
                name,
                fields: self.items,
            },
            SequenceKind::TupleVariant(name, variant) => Canonical::Variant {
                name,
                variant,
                payload: Box::new(Canonical::Tuple(self.items)),
            },
        }
    }
}

#[doc(hidden)]
pub struct MapCollector {
    entries: Vec<(Canonical, Canonical)>,
    pending_key: Option<Canonical>,
}

#[doc(hidden)]
pub struct StructCollector {
    name: &'static str,
    variant: Option<&'static str>,
    fields: Vec<(&'static str, Canonical)>,
}

impl StructCollector {
    fn finish(self) -> Canonical {
        let fields = Canonical::Struct {
            name: self.name,
            fields: self.fields,
        };
        match self.variant {
            Some(variant) => Canonical::Variant {
                name: self.name,
                variant,
                payload: Box::new(fields),
            },
            None => fields,
        }
    }
}

impl ser::Serializer for CanonicalSerializer {
    type Ok = Canonical;
    type Error = KeyError;

    type SerializeSeq = SequenceCollector;
    type SerializeTuple = SequenceCollector;
    type SerializeTupleStruct = SequenceCollector;
    type SerializeTupleVariant = SequenceCollector;
    type SerializeMap = MapCollector;
    type SerializeStruct = StructCollector;
    type SerializeStructVariant = StructCollector;

    fn serialize_bool(self, value: bool) -> Result<Canonical, KeyError> {
        Ok(Canonical::Bool(value))
    }

    fn serialize_i8(self, value: i8) -> Result<Canonical, KeyError> {
        Ok(Canonical::signed(value))
    }

    fn serialize_i16(self, value: i16) -> Result<Canonical, KeyError> {
        Ok(Canonical::signed(value))
    }

    fn serialize_i32(self, value: i32) -> Result<Canonical, KeyError> {
        Ok(Canonical::signed(value))
    }

    fn serialize_i64(self, value: i64) -> Result<Canonical, KeyError> {
        Ok(Canonical::signed(value))
    }

    fn serialize_i128(self, value: i128) -> Result<Canonical, KeyError> {
        Ok(Canonical::signed(value))
    }

    fn serialize_u8(self, value: u8) -> Result<Canonical, KeyError> {
        Ok(Canonical::unsigned(value))
    }

    fn serialize_u16(self, value: u16) -> Result<Canonical, KeyError> {
        Ok(Canonical::unsigned(value))
    }

    fn serialize_u32(self, value: u32) -> Result<Canonical, KeyError> {
        Ok(Canonical::unsigned(value))
    }

    fn serialize_u64(self, value: u64) -> Result<Canonical, KeyError> {
        Ok(Canonical::unsigned(value))
    }

    fn serialize_u128(self, value: u128) -> Result<Canonical, KeyError> {
        Ok(Canonical::unsigned(value))
    }

    fn serialize_f32(self, value: f32) -> Result<Canonical, KeyError> {
        Ok(Canonical::float(f64::from(value)))
    }

    fn serialize_f64(self, value: f64) -> Result<Canonical, KeyError> {
        Ok(Canonical::float(value))
    }

    fn serialize_char(self, value: char) -> Result<Canonical, KeyError> {
        Ok(Canonical::Char(value))
    }

    fn serialize_str(self, value: &str) -> Result<Canonical, KeyError> {
        Ok(Canonical::Text(value.to_owned()))
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<Canonical, KeyError> {
        Ok(Canonical::Bytes(value.to_vec()))
    }

    fn serialize_none(self) -> Result<Canonical, KeyError> {
        Ok(Canonical::Absent)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Canonical, KeyError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Canonical::Present(Box::new(to_canonical(value)?)))
    }

    fn serialize_unit(self) -> Result<Canonical, KeyError> {
        Ok(Canonical::Unit)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Canonical, KeyError> {
        Ok(Canonical::Newtype {
            name,
            value: Box::new(Canonical::Unit),
        })
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Canonical, KeyError> {
        Ok(Canonical::Variant {
            name,
            variant,
            payload: Box::new(Canonical::Unit),
        })
    }

    fn serialize_newtype_struct<T>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Canonical, KeyError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Canonical::Newtype {
            name,
            value: Box::new(to_canonical(value)?),
        })
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Canonical, KeyError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Canonical::Variant {
            name,
            variant,
            payload: Box::new(to_canonical(value)?),
        })
    }

    fn serialize_seq(self, length: Option<usize>) -> Result<SequenceCollector, KeyError> {
        Ok(SequenceCollector::new(SequenceKind::Sequence, length))
    }

    fn serialize_tuple(self, length: usize) -> Result<SequenceCollector, KeyError> {
        Ok(SequenceCollector::new(SequenceKind::Tuple, Some(length)))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        length: usize,
    ) -> Result<SequenceCollector, KeyError> {
        Ok(SequenceCollector::new(
            SequenceKind::TupleStruct(name),
            Some(length),
        ))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        length: usize,
    ) -> Result<SequenceCollector, KeyError> {
        Ok(SequenceCollector::new(
            SequenceKind::TupleVariant(name, variant),
            Some(length),
        ))
    }

    fn serialize_map(self, length: Option<usize>) -> Result<MapCollector, KeyError> {
        Ok(MapCollector {
            entries: Vec::with_capacity(length.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        length: usize,
    ) -> Result<StructCollector, KeyError> {
        Ok(StructCollector {
            name,
            variant: None,
            fields: Vec::with_capacity(length),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        length: usize,
    ) -> Result<StructCollector, KeyError> {
        Ok(StructCollector {
            name,
            variant: Some(variant),
            fields: Vec::with_capacity(length),
        })
    }
}

impl SerializeSeq for SequenceCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Canonical, KeyError> {
        Ok(self.finish())
    }
}

impl SerializeTuple for SequenceCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Canonical, KeyError> {
        Ok(self.finish())
    }
}

impl SerializeTupleStruct for SequenceCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Canonical, KeyError> {
        Ok(self.finish())
    }
}

impl SerializeTupleVariant for SequenceCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Canonical, KeyError> {
        Ok(self.finish())
    }
}

impl SerializeMap for MapCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.pending_key = Some(to_canonical(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        let key = self.pending_key.take().ok_or_else(|| {
            <KeyError as ser::Error>::custom("map value serialized before its key")
        })?;
        self.entries.push((key, to_canonical(value)?));
        Ok(())
    }

    fn end(self) -> Result<Canonical, KeyError> {
        if self.pending_key.is_some() {
            return Err(<KeyError as ser::Error>::custom(
                "map key serialized without a value",
            ));
        }
        Ok(Canonical::map(self.entries))
    }
}

impl SerializeStruct for StructCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.fields.push((key, to_canonical(value)?));
        Ok(())
    }

    fn end(self) -> Result<Canonical, KeyError> {
        Ok(self.finish())
    }
}

impl SerializeStructVariant for StructCollector {
    type Ok = Canonical;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), KeyError>
    where
        T: Serialize + ?Sized,
    {
        self.fields.push((key, to_canonical(value)?));
        Ok(())
    }

    fn end(self) -> Result<Canonical, KeyError> {
        Ok(self.finish())
    }
}
