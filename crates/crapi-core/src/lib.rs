//! crapi Core - generic object mapping for the crapi translation engine
//!
//! This crate provides the path-addressable object capability the
//! translation engine is built on:
//! - `objmap`: conversion between typed values and JSON object maps, with
//!   case-insensitive struct field matching
//! - `path`: dotted-path helpers and nested field navigation, including
//!   fan-out over array elements
//! - `error`: the `NotFound` sentinel and conversion errors

pub mod error;
mod fold;
pub mod objmap;
pub mod path;

pub use error::{ObjMapError, Result};
pub use objmap::{from_object_map, from_object_map_into, from_value, to_object_map, ObjectMap};
pub use path::{
    as_path, base, copy_fields, dir, get_field, get_field_object, get_or_create_field,
    get_value, holders_mut, join, remove_field, set_field, Holder, ANY_ITEM,
};
