//! CRD schema representation
//!
//! A parsed CustomResourceDefinition reduced to what translation needs: the
//! resource names, its versions, and an OpenAPI tree that keeps every `x-*`
//! extension so reference mappings can be discovered on it.

use std::collections::BTreeMap;

use crapi_core::ObjectMap;
use serde_json::Value;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// API group (e.g., "atlas.generated.mongodb.com")
    pub group: String,
    pub names: CrdNames,
    /// API versions with their schemas
    pub versions: Vec<CrdVersionSchema>,
    /// Annotations from the CRD metadata
    pub annotations: BTreeMap<String, String>,
}

impl CrdSchema {
    /// Versions served by the API server
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersionSchema> {
        self.versions.iter().filter(|v| v.served)
    }

    /// Look up a version by name
    pub fn version(&self, name: &str) -> Option<&CrdVersionSchema> {
        self.versions.iter().find(|v| v.name == name)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Kind and plural resource name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    pub kind: String,
    pub plural: String,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersionSchema {
    /// Version name (e.g., "v1")
    pub name: String,
    pub served: bool,
    pub schema: Option<OpenApiSchema>,
}

impl CrdVersionSchema {
    pub fn spec_schema(&self) -> Option<&SchemaProperty> {
        self.schema.as_ref().and_then(|s| s.property("spec"))
    }

    /// Check whether `spec.<version>` is declared
    pub fn has_sdk_version(&self, version: &str) -> bool {
        self.spec_schema()
            .and_then(|spec| spec.property(version))
            .is_some()
    }
}

/// Root of an OpenAPI v3 schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenApiSchema {
    /// Root properties (typically: apiVersion, kind, metadata, spec, status)
    pub properties: BTreeMap<String, SchemaProperty>,
    pub x_preserve_unknown: bool,
}

impl OpenApiSchema {
    pub fn property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    /// Drop fields the schema does not declare, the way the API server prunes
    /// structural schemas. `apiVersion`, `kind` and `metadata` always survive.
    pub fn prune(&self, object: &mut ObjectMap) {
        if self.x_preserve_unknown || self.properties.is_empty() {
            return;
        }
        object.retain(|key, _| {
            matches!(key.as_str(), "apiVersion" | "kind" | "metadata")
                || self.properties.contains_key(key)
        });
        for (key, value) in object.iter_mut() {
            if let Some(prop) = self.properties.get(key) {
                prop.prune(value);
            }
        }
    }
}

/// Schema node of a single property
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    /// Array item schema
    pub items: Option<Box<SchemaProperty>>,
    pub x_preserve_unknown: bool,
    /// Every `x-*` key found on the node, verbatim
    pub extensions: BTreeMap<String, Value>,
}

impl SchemaProperty {
    /// Direct child property
    pub fn property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.as_ref()?.get(name)
    }

    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    fn prune(&self, value: &mut Value) {
        if self.x_preserve_unknown {
            return;
        }
        match value {
            Value::Object(obj) => {
                let Some(props) = self.properties.as_ref().filter(|p| !p.is_empty()) else {
                    return;
                };
                obj.retain(|key, _| props.contains_key(key));
                for (key, child) in obj.iter_mut() {
                    if let Some(prop) = props.get(key) {
                        prop.prune(child);
                    }
                }
            }
            Value::Array(items) => {
                if let Some(item_schema) = &self.items {
                    for item in items {
                        item_schema.prune(item);
                    }
                }
            }
            _ => {}
        }
    }
}
