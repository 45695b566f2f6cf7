//! Dotted-path addressing over JSON object maps
//!
//! Paths are lists of segments. Object keys are addressed by name, array
//! elements by their decimal index, and the synthetic [`ANY_ITEM`] segment
//! (`[]`) fans out over every element of an array.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ObjMapError, Result};
use crate::objmap::{from_value, ObjectMap};

/// Path segment standing for "every element of this array"
pub const ANY_ITEM: &str = "[]";

/// Split a dotted path into segments, dropping the leading empty segment
/// produced by a leading dot (`.a.b` and `a.b` are the same path)
pub fn as_path(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = path.split('.').map(String::from).collect();
    if segments.first().is_some_and(|s| s.is_empty()) {
        segments.remove(0);
    }
    segments
}

/// Last segment of a path, or `""` for the empty path
pub fn base<S: AsRef<str>>(path: &[S]) -> &str {
    path.last().map(AsRef::as_ref).unwrap_or_default()
}

/// All but the last segment of a path
pub fn dir<S: Clone>(path: &[S]) -> Vec<S> {
    match path.split_last() {
        Some((_, parent)) => parent.to_vec(),
        None => Vec::new(),
    }
}

/// Render a path for messages
pub fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}

/// Borrow the value at `path`
///
/// Fails with [`ObjMapError::NotFound`] when a segment or the final key is
/// absent, and with [`ObjMapError::TypeMismatch`] when the path runs through
/// a scalar.
pub fn get_value<'a, S: AsRef<str>>(map: &'a ObjectMap, path: &[S]) -> Result<&'a Value> {
    let Some((first, rest)) = path.split_first() else {
        return Err(ObjMapError::not_found(path));
    };
    let mut current = map
        .get(first.as_ref())
        .ok_or_else(|| ObjMapError::not_found(&path[..1]))?;

    for (depth, segment) in rest.iter().enumerate() {
        let walked = &path[..depth + 2];
        current = match current {
            Value::Object(obj) => obj
                .get(segment.as_ref())
                .ok_or_else(|| ObjMapError::not_found(walked))?,
            Value::Array(items) => segment
                .as_ref()
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .ok_or_else(|| ObjMapError::not_found(walked))?,
            Value::Null => return Err(ObjMapError::not_found(walked)),
            other => return Err(ObjMapError::mismatch(&path[..depth + 1], "object", other)),
        };
    }
    Ok(current)
}

/// Read and convert the value at `path`
pub fn get_field<T: DeserializeOwned, S: AsRef<str>>(map: &ObjectMap, path: &[S]) -> Result<T> {
    let value = get_value(map, path)?;
    from_value(value.clone())
}

/// Borrow the object stored at `path`
pub fn get_field_object<'a, S: AsRef<str>>(map: &'a ObjectMap, path: &[S]) -> Result<&'a ObjectMap> {
    match get_value(map, path)? {
        Value::Object(obj) => Ok(obj),
        other => Err(ObjMapError::mismatch(path, "object", other)),
    }
}

/// Mutably borrow the object at `path`, creating it (and its parents) from
/// `default` when absent. Null values along the way are replaced.
pub fn get_or_create_field<'a, S: AsRef<str>>(
    map: &'a mut ObjectMap,
    default: ObjectMap,
    path: &[S],
) -> Result<&'a mut ObjectMap> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(map);
    };
    let slot = map
        .entry(first.as_ref().to_string())
        .or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Object(if rest.is_empty() { default.clone() } else { Map::new() });
    }
    match slot {
        Value::Object(obj) => get_or_create_field(obj, default, rest),
        other => Err(ObjMapError::mismatch(&path[..1], "object", other)),
    }
}

/// Store `value` at `path`, creating intermediate objects as needed
pub fn set_field<S: AsRef<str>>(map: &mut ObjectMap, path: &[S], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(ObjMapError::not_found(path));
    };
    let holder = get_or_create_field(map, Map::new(), parents)?;
    holder.insert(last.as_ref().to_string(), value);
    Ok(())
}

/// Remove and return the value at `path`, if any
///
/// Only walks through objects; a missing or non-object parent yields `None`.
pub fn remove_field<S: AsRef<str>>(map: &mut ObjectMap, path: &[S]) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for segment in parents {
        current = current.get_mut(segment.as_ref())?.as_object_mut()?;
    }
    current.remove(last.as_ref())
}

/// Shallow-copy every top-level entry of `src` into `dst`
pub fn copy_fields(dst: &mut ObjectMap, src: &ObjectMap) {
    for (key, value) in src {
        dst.insert(key.clone(), value.clone());
    }
}

/// An object reached while resolving a path that may fan out over arrays
#[derive(Debug)]
pub struct Holder<'a> {
    /// Concrete path to the object, with array indices in place of `[]`
    pub path: Vec<String>,
    /// Whether an array was fanned out on the way here
    pub via_array: bool,
    pub map: &'a mut ObjectMap,
}

/// Resolve every object at `path`, fanning out over `[]` segments
///
/// A missing segment outside of any array is the not-found sentinel. Inside a
/// fan-out, elements that do not contain the rest of the path are skipped, so
/// an existing but empty array yields no holders at all.
pub fn holders_mut<'a>(map: &'a mut ObjectMap, path: &[String]) -> Result<Vec<Holder<'a>>> {
    let mut out = Vec::new();
    collect_in_map(map, path, Vec::new(), false, &mut out)?;
    Ok(out)
}

fn collect_in_map<'a>(
    map: &'a mut ObjectMap,
    rest: &[String],
    walked: Vec<String>,
    via_array: bool,
    out: &mut Vec<Holder<'a>>,
) -> Result<()> {
    let Some((head, tail)) = rest.split_first() else {
        out.push(Holder {
            path: walked,
            via_array,
            map,
        });
        return Ok(());
    };
    let mut next_path = walked;
    next_path.push(head.clone());
    match map.get_mut(head.as_str()) {
        Some(next) => collect_in_value(next, tail, next_path, via_array, out),
        None => Err(ObjMapError::not_found(&next_path)),
    }
}

fn collect_in_value<'a>(
    value: &'a mut Value,
    rest: &[String],
    walked: Vec<String>,
    via_array: bool,
    out: &mut Vec<Holder<'a>>,
) -> Result<()> {
    match value {
        Value::Object(obj) => collect_in_map(obj, rest, walked, via_array, out),
        Value::Array(items) => {
            let Some((head, tail)) = rest.split_first() else {
                return Err(ObjMapError::TypeMismatch {
                    path: join(&walked),
                    expected: "object",
                    found: "array",
                });
            };
            if head == ANY_ITEM {
                for (idx, item) in items.iter_mut().enumerate() {
                    let mut item_path = walked.clone();
                    item_path.push(idx.to_string());
                    match collect_in_value(item, tail, item_path, true, out) {
                        Err(err) if err.is_not_found() => continue,
                        other => other?,
                    }
                }
                return Ok(());
            }
            let mut item_path = walked;
            item_path.push(head.clone());
            let item = head
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get_mut(idx))
                .ok_or_else(|| ObjMapError::not_found(&item_path))?;
            collect_in_value(item, tail, item_path, via_array, out)
        }
        Value::Null => Err(ObjMapError::not_found(&walked)),
        other => Err(ObjMapError::mismatch(&walked, "object", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> ObjectMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("test value must be an object"),
        }
    }

    #[test]
    fn test_as_path() {
        assert_eq!(as_path(".data.#"), vec!["data", "#"]);
        assert_eq!(as_path("groupId"), vec!["groupId"]);
        assert_eq!(as_path("a.b.c"), vec!["a", "b", "c"]);
        assert!(as_path("").is_empty());
    }

    #[test]
    fn test_base_and_dir() {
        let path = vec!["spec".to_string(), "v1".to_string(), "groupRef".to_string()];
        assert_eq!(base(&path), "groupRef");
        assert_eq!(dir(&path), vec!["spec", "v1"]);

        let empty: Vec<String> = Vec::new();
        assert_eq!(base(&empty), "");
        assert!(dir(&empty).is_empty());
    }

    #[test]
    fn test_get_field_nested() {
        let map = obj(json!({
            "status": {"v1": {"id": "62b6e34b"}},
            "items": [{"name": "first"}, {"name": "second"}]
        }));

        let id: String = get_field(&map, &["status", "v1", "id"]).unwrap();
        assert_eq!(id, "62b6e34b");

        let second: String = get_field(&map, &["items", "1", "name"]).unwrap();
        assert_eq!(second, "second");
    }

    #[test]
    fn test_get_field_not_found() {
        let map = obj(json!({"status": {"v1": {}}}));

        let err = get_field::<String, _>(&map, &["status", "v1", "id"]).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "field not found at status.v1.id");

        let err = get_field::<String, _>(&map, &["spec", "v1", "id"]).unwrap_err();
        assert!(err.is_not_found());

        let err = get_field::<String, _>(&map, &["items", "3"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_field_through_scalar_is_mismatch() {
        let map = obj(json!({"spec": "flat"}));
        let err = get_field::<String, _>(&map, &["spec", "name"]).unwrap_err();
        assert!(matches!(err, ObjMapError::TypeMismatch { .. }));
    }

    #[test]
    fn test_get_field_object() {
        let map = obj(json!({"spec": {"v1": {"entry": {"name": "x"}}}}));
        let entry = get_field_object(&map, &["spec", "v1", "entry"]).unwrap();
        assert_eq!(entry.get("name"), Some(&json!("x")));

        assert!(get_field_object(&map, &["spec", "v1", "entry", "name"]).is_err());
    }

    #[test]
    fn test_get_or_create_field() {
        let mut map = obj(json!({"status": null}));

        let status = get_or_create_field(&mut map, Map::new(), &["status", "v1"]).unwrap();
        status.insert("id".to_string(), json!("abc"));

        assert_eq!(map, obj(json!({"status": {"v1": {"id": "abc"}}})));

        let existing = get_or_create_field(&mut map, Map::new(), &["status", "v1"]).unwrap();
        assert_eq!(existing.get("id"), Some(&json!("abc")));
    }

    #[test]
    fn test_set_field() {
        let mut map = ObjectMap::new();
        set_field(&mut map, &["data", "apiKey"], json!("c2VjcmV0")).unwrap();
        assert_eq!(map, obj(json!({"data": {"apiKey": "c2VjcmV0"}})));
    }

    #[test]
    fn test_remove_field() {
        let mut map = obj(json!({"entry": {"apiKey": "secret", "name": "n"}}));
        assert_eq!(remove_field(&mut map, &["entry", "apiKey"]), Some(json!("secret")));
        assert_eq!(remove_field(&mut map, &["entry", "apiKey"]), None);
        assert_eq!(remove_field(&mut map, &["entry", "name", "deeper"]), None);
        assert_eq!(map, obj(json!({"entry": {"name": "n"}})));
    }

    #[test]
    fn test_copy_fields() {
        let mut dst = obj(json!({"keep": 1, "name": "old"}));
        let src = obj(json!({"name": "new", "tags": ["a"]}));
        copy_fields(&mut dst, &src);
        assert_eq!(dst, obj(json!({"keep": 1, "name": "new", "tags": ["a"]})));
    }

    #[test]
    fn test_holders_fan_out() {
        let mut map = obj(json!({
            "spec": {"notifications": [
                {"datadogApiKey": "k"},
                {"webhookUrl": "u"},
                "scalar"
            ]}
        }));
        let path = as_path("spec.notifications.[]");
        let err = holders_mut(&mut map, &path).unwrap_err();
        assert!(matches!(err, ObjMapError::TypeMismatch { .. }));

        let mut map = obj(json!({
            "spec": {"notifications": [{"datadogApiKey": "k"}, {"webhookUrl": "u"}]}
        }));
        let holders = holders_mut(&mut map, &path).unwrap();
        assert_eq!(holders.len(), 2);
        assert_eq!(holders[1].path, vec!["spec", "notifications", "1"]);
        assert!(holders.iter().all(|h| h.via_array));
    }

    #[test]
    fn test_holders_absent_path() {
        let mut map = obj(json!({"spec": {}}));
        let err = holders_mut(&mut map, &as_path("spec.credentials")).unwrap_err();
        assert!(err.is_not_found());

        let mut map = obj(json!({"spec": {"items": []}}));
        let holders = holders_mut(&mut map, &as_path("spec.items.[]")).unwrap();
        assert!(holders.is_empty());
    }
}
