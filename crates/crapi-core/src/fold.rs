//! Case-insensitive struct field matching
//!
//! [`FoldDeserializer`] walks a `serde_json::Value` like the stock value
//! deserializer, except that object keys destined for a struct are folded onto
//! the struct's declared field names, ignoring ASCII case. Derived
//! `Deserialize` impls hand the field list to `deserialize_struct`, which is
//! all the information needed. Exact matches always win over folded ones.

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

pub(crate) struct FoldDeserializer(pub(crate) Value);

impl<'de> de::Deserializer<'de> for FoldDeserializer {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(FoldMap::new(map)),
            Value::Array(items) => visitor.visit_seq(FoldSeq {
                iter: items.into_iter(),
            }),
            scalar => de::Deserializer::deserialize_any(scalar, visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(FoldDeserializer(value)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(FoldMap::new(fold_keys(map, fields))),
            value => de::Deserializer::deserialize_any(FoldDeserializer(value), visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
    }
}

/// Rename keys that match a declared field up to ASCII case
fn fold_keys(map: Map<String, Value>, fields: &'static [&'static str]) -> Map<String, Value> {
    let exact: Vec<&'static str> = fields
        .iter()
        .copied()
        .filter(|field| map.contains_key(*field))
        .collect();

    let mut folded = Map::new();
    for (key, value) in map {
        if exact.contains(&key.as_str()) {
            folded.insert(key, value);
            continue;
        }
        match fields.iter().find(|field| field.eq_ignore_ascii_case(&key)) {
            Some(field) if exact.contains(field) => {}
            Some(field) => {
                folded.insert((*field).to_string(), value);
            }
            None => {
                folded.insert(key, value);
            }
        }
    }
    folded
}

struct FoldMap {
    iter: serde_json::map::IntoIter,
    value: Option<Value>,
}

impl FoldMap {
    fn new(map: Map<String, Value>) -> Self {
        Self {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for FoldMap {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Value::String(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(FoldDeserializer(value)),
            None => Err(de::Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct FoldSeq {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for FoldSeq {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.iter
            .next()
            .map(|value| seed.deserialize(FoldDeserializer(value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
