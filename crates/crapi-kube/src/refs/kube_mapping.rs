//! The `x-kubernetes-mapping` descriptor
//!
//! Describes the Kubernetes object a reference points at: its type, where a
//! raw API value is stored in it (`propertySelectors`, with `#` standing for
//! the field key), which of its fields identify it (`properties`), and which
//! field of the reference record holds its name (`nameSelector`).

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use crapi_core::{ObjectMap, error::kind_of, get_value, join, set_field, to_object_map};
use kube::{
    api::DynamicObject,
    core::{ApiResource, GroupVersionKind},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mapping::resolve_xpath;
use crate::error::{CrapiError, Result};

/// Schema extension carrying the Kubernetes side of a reference
pub const X_KUBERNETES_MAPPING: &str = "x-kubernetes-mapping";

/// Placeholder segment replaced by the field key in property selectors
const KEY_PLACEHOLDER: &str = "#";

const DEFAULT_NAME_FIELD: &str = "name";

/// Group, version, kind and plural of the referenced object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KubeType {
    /// API group, empty for the core group
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
    /// Plural resource name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
}

impl KubeType {
    /// Check whether an object of `gvk` is of this type
    ///
    /// An empty version accepts any version of the kind.
    pub fn matches(&self, gvk: &GroupVersionKind) -> bool {
        self.kind == gvk.kind
            && self.group == gvk.group
            && (self.version.is_empty() || self.version == gvk.version)
    }

    pub fn is_secret(&self) -> bool {
        self.group.is_empty() && self.kind == "Secret"
    }
}

impl fmt::Display for KubeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.kind.is_empty() {
            &self.resource
        } else {
            &self.kind
        };
        if self.group.is_empty() {
            write!(f, "{name}")
        } else {
            write!(f, "{name}.{}", self.group)
        }
    }
}

/// Kubernetes descriptor of a reference
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeMapping {
    /// Field of the reference record holding the object name (`.name`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_selector: String,

    /// Object fields identifying the referenced value (`$.status.v1.id`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,

    /// Object locations a raw value is written to (`$.data.#`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_selectors: Vec<String>,

    #[serde(rename = "type")]
    pub type_: KubeType,
}

impl KubeMapping {
    /// Whether raw values can be moved into new objects of this type
    ///
    /// Without property selectors there is nowhere to put them, and the
    /// mapping only ever points at existing objects.
    pub fn can_create(&self) -> bool {
        !self.property_selectors.is_empty()
    }

    /// Path of the name field inside a reference record
    pub fn name_field(&self) -> Vec<String> {
        let path = resolve_xpath(&self.name_selector);
        if path.is_empty() {
            vec![DEFAULT_NAME_FIELD.to_string()]
        } else {
            path
        }
    }

    /// Object name held by a reference record
    pub fn referenced_name<'r>(&self, reference: &'r ObjectMap) -> Result<&'r str> {
        let field = self.name_field();
        match get_value(reference, &field) {
            Ok(Value::String(name)) if !name.is_empty() => Ok(name),
            _ => Err(CrapiError::MissingReferenceName {
                selector: join(&field),
            }),
        }
    }

    /// Build a reference record pointing at `name`
    pub fn reference(&self, name: &str, key: Option<&str>) -> Result<ObjectMap> {
        let mut reference = ObjectMap::new();
        set_field(&mut reference, &self.name_field(), Value::String(name.to_string()))?;
        if let Some(key) = key {
            reference.insert(super::REF_KEY.to_string(), Value::String(key.to_string()));
        }
        Ok(reference)
    }

    /// Text form of a raw API value
    pub fn encode(&self, raw: &Value) -> Result<String> {
        match raw {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(CrapiError::Schema(format!(
                "cannot store {} value in a {}",
                kind_of(other),
                self.type_
            ))),
        }
    }

    /// Create a new object named `name` holding `text` under `key`
    ///
    /// Returns the object and the key actually used.
    pub fn build(
        &self,
        resource: &ApiResource,
        name: &str,
        namespace: Option<&str>,
        key: &str,
        text: &str,
    ) -> Result<(DynamicObject, String)> {
        let mut object = DynamicObject::new(name, resource);
        if let Some(namespace) = namespace {
            object = object.within(namespace);
        }
        let mut body = ObjectMap::new();
        let key = self.place(&mut body, key, text)?;
        object.data = Value::Object(body);
        Ok((object, key))
    }

    /// Write `text` at every property selector of `body`
    ///
    /// When a selected slot already holds a different value, the key gets a
    /// numeric suffix (`apiKey-1`, `apiKey-2`, ...) until all slots are free.
    pub fn place(&self, body: &mut ObjectMap, key: &str, text: &str) -> Result<String> {
        if !self.can_create() {
            return Err(CrapiError::Schema(format!(
                "{} mapping has no property selectors",
                self.type_
            )));
        }
        let key = self.free_key(body, key, text);
        for selector in &self.property_selectors {
            let path = selector_path(selector, &key);
            let stored = self.stored_form(&path, text);
            set_field(body, &path, stored)?;
        }
        Ok(key)
    }

    fn free_key(&self, body: &ObjectMap, key: &str, text: &str) -> String {
        let mut candidate = key.to_string();
        let mut suffix = 0;
        while self.property_selectors.iter().any(|selector| {
            let path = selector_path(selector, &candidate);
            matches!(get_value(body, &path), Ok(existing) if *existing != self.stored_form(&path, text))
        }) {
            suffix += 1;
            candidate = format!("{key}-{suffix}");
        }
        candidate
    }

    /// Read the referenced value back out of a dependency
    ///
    /// The first of `properties` present wins. When none is, the value is
    /// read from the property selectors for `key`.
    pub fn fetch(&self, dependency: &DynamicObject, key: &str) -> Result<Value> {
        let object = to_object_map(dependency)?;
        let name = dependency.metadata.name.clone().unwrap_or_default();

        for property in &self.properties {
            match get_value(&object, &resolve_xpath(property)) {
                Ok(Value::Null) => continue,
                Ok(value) => return Ok(value.clone()),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err.into()),
            }
        }

        for selector in &self.property_selectors {
            let path = selector_path(selector, key);
            match get_value(&object, &path) {
                Ok(Value::Null) => continue,
                Ok(value) => return self.decoded_form(&path, value),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let key = if self.property_selectors.is_empty() {
            self.properties.join(", ")
        } else {
            key.to_string()
        };
        Err(CrapiError::MissingKey { name, key })
    }

    /// Secret `data` is base64 on the wire
    fn is_binary_slot(&self, path: &[String]) -> bool {
        self.type_.is_secret() && path.first().is_some_and(|s| s == "data")
    }

    fn stored_form(&self, path: &[String], text: &str) -> Value {
        if self.is_binary_slot(path) {
            Value::String(STANDARD.encode(text))
        } else {
            Value::String(text.to_string())
        }
    }

    fn decoded_form(&self, path: &[String], value: &Value) -> Result<Value> {
        if !self.is_binary_slot(path) {
            return Ok(value.clone());
        }
        let encoded = value.as_str().ok_or_else(|| {
            CrapiError::Schema(format!("{} holds a {}, expected base64", join(path), kind_of(value)))
        })?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CrapiError::Schema(format!("{} is not valid base64: {}", join(path), e)))?;
        String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|e| CrapiError::Schema(format!("{} is not valid UTF-8: {}", join(path), e)))
    }
}

fn selector_path(selector: &str, key: &str) -> Vec<String> {
    resolve_xpath(selector)
        .into_iter()
        .map(|segment| {
            if segment == KEY_PLACEHOLDER {
                key.to_string()
            } else {
                segment
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crapi_core::from_value;
    use k8s_openapi::api::core::v1::Secret;
    use serde_json::json;

    fn secret_mapping() -> KubeMapping {
        KubeMapping {
            property_selectors: vec!["$.data.#".to_string()],
            type_: KubeType {
                version: "v1".to_string(),
                kind: "Secret".to_string(),
                resource: "secrets".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn secret_resource() -> ApiResource {
        ApiResource::erase::<Secret>(&())
    }

    #[test]
    fn test_decode_wire_shape() {
        let mapping: KubeMapping = from_value(json!({
            "nameSelector": ".name",
            "properties": ["$.status.v20250312.id"],
            "type": {
                "group": "atlas.generated.mongodb.com",
                "kind": "Group",
                "resource": "groups",
                "version": "v1"
            }
        }))
        .unwrap();

        assert_eq!(mapping.name_field(), vec!["name"]);
        assert_eq!(mapping.properties, vec!["$.status.v20250312.id"]);
        assert!(!mapping.can_create());
        assert_eq!(mapping.type_.to_string(), "Group.atlas.generated.mongodb.com");
        assert!(mapping.type_.matches(&GroupVersionKind::gvk(
            "atlas.generated.mongodb.com",
            "v1",
            "Group"
        )));
        assert!(!mapping.type_.matches(&GroupVersionKind::gvk("", "v1", "Group")));
    }

    #[test]
    fn test_build_secret() {
        let mapping = secret_mapping();
        let (secret, key) = mapping
            .build(&secret_resource(), "cfg-abc", Some("atlas"), "apiKey", "fake api key")
            .unwrap();

        assert_eq!(key, "apiKey");
        assert_eq!(secret.metadata.name.as_deref(), Some("cfg-abc"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("atlas"));
        assert_eq!(secret.types.as_ref().unwrap().kind, "Secret");
        assert_eq!(secret.data, json!({"data": {"apiKey": "ZmFrZSBhcGkga2V5"}}));

        assert_eq!(mapping.fetch(&secret, "apiKey").unwrap(), json!("fake api key"));
    }

    #[test]
    fn test_place_allocates_suffixed_key() {
        let mapping = secret_mapping();
        let mut body = ObjectMap::new();

        assert_eq!(mapping.place(&mut body, "apiKey", "first").unwrap(), "apiKey");
        // Same value: slot reused
        assert_eq!(mapping.place(&mut body, "apiKey", "first").unwrap(), "apiKey");
        assert_eq!(mapping.place(&mut body, "apiKey", "second").unwrap(), "apiKey-1");
        assert_eq!(mapping.place(&mut body, "apiKey", "third").unwrap(), "apiKey-2");

        let data = body["data"].as_object().unwrap();
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_place_without_selectors() {
        let mapping = KubeMapping::default();
        assert!(mapping.place(&mut ObjectMap::new(), "k", "v").is_err());
    }

    #[test]
    fn test_plain_slot_is_not_encoded() {
        let mapping = KubeMapping {
            property_selectors: vec!["$.data.#".to_string()],
            type_: KubeType {
                version: "v1".to_string(),
                kind: "ConfigMap".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut body = ObjectMap::new();
        mapping.place(&mut body, "region", "EU_WEST_1").unwrap();
        assert_eq!(Value::Object(body), json!({"data": {"region": "EU_WEST_1"}}));
    }

    #[test]
    fn test_fetch_by_properties() {
        let mapping: KubeMapping = from_value(json!({
            "properties": ["$.status.v1.missing", "$.status.v1.id"],
            "type": {"group": "atlas.generated.mongodb.com", "version": "v1", "kind": "Group"}
        }))
        .unwrap();
        let group: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "atlas.generated.mongodb.com/v1",
            "kind": "Group",
            "metadata": {"name": "my-project"},
            "status": {"v1": {"id": "62b6e34b"}}
        }))
        .unwrap();

        assert_eq!(mapping.fetch(&group, "groupId").unwrap(), json!("62b6e34b"));

        let pending: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "atlas.generated.mongodb.com/v1",
            "kind": "Group",
            "metadata": {"name": "my-project"},
            "status": {"v1": {"id": null}}
        }))
        .unwrap();
        assert!(matches!(
            mapping.fetch(&pending, "groupId"),
            Err(CrapiError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_fetch_falls_back_to_selectors() {
        let mapping = KubeMapping {
            properties: vec!["$.status.v1.apiKey".to_string()],
            ..secret_mapping()
        };
        let mut secret = DynamicObject::new("s", &secret_resource());
        secret.data = json!({"data": {"apiKey": "c2VjcmV0"}});

        assert_eq!(mapping.fetch(&secret, "apiKey").unwrap(), json!("secret"));

        let err = mapping.fetch(&secret, "other").unwrap_err();
        assert!(matches!(err, CrapiError::MissingKey { key, .. } if key == "other"));
    }

    #[test]
    fn test_reference_record() {
        let mapping = secret_mapping();
        let reference = mapping.reference("cfg-abc", Some("apiKey")).unwrap();
        assert_eq!(Value::Object(reference.clone()), json!({"name": "cfg-abc", "key": "apiKey"}));
        assert_eq!(mapping.referenced_name(&reference).unwrap(), "cfg-abc");

        let empty = ObjectMap::new();
        assert!(matches!(
            mapping.referenced_name(&empty),
            Err(CrapiError::MissingReferenceName { .. })
        ));
    }

    #[test]
    fn test_encode() {
        let mapping = secret_mapping();
        assert_eq!(mapping.encode(&json!("s")).unwrap(), "s");
        assert_eq!(mapping.encode(&json!(12)).unwrap(), "12");
        assert_eq!(mapping.encode(&json!(false)).unwrap(), "false");
        assert!(mapping.encode(&json!({"nested": true})).is_err());
    }
}
