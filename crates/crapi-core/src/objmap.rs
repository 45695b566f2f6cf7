//! Conversion between typed values and generic object maps
//!
//! An object map is the JSON object form of a value: string keys in, arbitrary
//! JSON values out. Serialization uses the value's own serde names; the way
//! back matches map keys onto struct fields ignoring case, so a map produced
//! by one naming convention still populates a struct declared with another.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ObjMapError, Result};
use crate::fold::FoldDeserializer;

/// Generic ordered mapping of string keys to JSON values
pub type ObjectMap = Map<String, Value>;

/// Convert any serializable value into its object map
///
/// Values that do not serialize to a JSON object are a type mismatch.
pub fn to_object_map<T: Serialize + ?Sized>(value: &T) -> Result<ObjectMap> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ObjMapError::mismatch::<&str>(&[], "object", &other)),
    }
}

/// Build a typed value from an object map
pub fn from_object_map<T: DeserializeOwned>(map: ObjectMap) -> Result<T> {
    from_value(Value::Object(map))
}

/// Overwrite `target` with the value decoded from `map`
pub fn from_object_map_into<T: DeserializeOwned>(target: &mut T, map: ObjectMap) -> Result<()> {
    *target = from_object_map(map)?;
    Ok(())
}

/// Build a typed value from any JSON value, folding struct field names
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(FoldDeserializer(value)).map_err(ObjMapError::from)
}
