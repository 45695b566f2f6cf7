//! Compiled reference mappings and the `x-openapi-mapping` descriptor

use crapi_core::{as_path, base, dir, error::kind_of};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::kube_mapping::KubeMapping;
use super::names::dependency_name;
use crate::error::{CrapiError, Result};

/// Schema extension carrying the API side of a reference
pub const X_OPENAPI_MAPPING: &str = "x-openapi-mapping";

/// Resolve a `$.a.b` or `.a.b` expression into path segments
pub fn resolve_xpath(xpath: &str) -> Vec<String> {
    as_path(xpath.strip_prefix('$').unwrap_or(xpath))
}

/// Where a referenced value lives in the API shape, and its type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenApiMapping {
    /// Path into the API object, relative to the reference holder
    #[serde(default)]
    pub property: String,

    /// OpenAPI type of the value (`string`, `integer`, `number`, `boolean`)
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,
}

impl OpenApiMapping {
    pub fn target_path(&self) -> Vec<String> {
        resolve_xpath(&self.property)
    }

    /// Convert a value read from Kubernetes into the declared API type
    ///
    /// Secrets and status fields hand back strings; numbers and booleans are
    /// parsed from them. Values already of the right shape pass through.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let invalid = |found: &str| {
            CrapiError::Schema(format!(
                "cannot convert {} to {} for '{}'",
                found, self.type_, self.property
            ))
        };
        match (self.type_.as_str(), value) {
            ("string", Value::Number(n)) => Ok(Value::String(n.to_string())),
            ("string", Value::Bool(b)) => Ok(Value::String(b.to_string())),
            ("integer", Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(&format!("'{s}'"))),
            ("number", Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(&format!("'{s}'"))),
            ("boolean", Value::String(s)) => s
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| invalid(&format!("'{s}'"))),
            ("string", v @ (Value::Array(_) | Value::Object(_))) => Err(invalid(kind_of(&v))),
            (_, v) => Ok(v),
        }
    }
}

/// One reference rule found in a CRD schema
///
/// `path` addresses the reference field in the custom resource; `[]`
/// segments stand for every element of an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    path: Vec<String>,
    property_name: String,
    #[serde(rename = "kubernetes")]
    kube: KubeMapping,
    openapi: OpenApiMapping,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optional: bool,
}

impl Mapping {
    pub fn new(path: Vec<String>, kube: KubeMapping, openapi: OpenApiMapping) -> Self {
        let property_name = base(&path).to_string();
        Self {
            path,
            property_name,
            kube,
            openapi,
            optional: false,
        }
    }

    /// Mark whether expansion may keep the raw value when nothing matches
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Name of the reference field, the last path segment
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn kube_mapping(&self) -> &KubeMapping {
        &self.kube
    }

    pub fn openapi_mapping(&self) -> &OpenApiMapping {
        &self.openapi
    }

    /// Path of the raw API value in the custom resource
    pub fn collapsed_path(&self) -> Vec<String> {
        let mut path = dir(&self.path);
        path.extend(self.openapi.target_path());
        path
    }

    /// The collapsed path split into the holder path and the target path
    /// relative to each holder
    pub(crate) fn split_collapsed_path(&self) -> (Vec<String>, Vec<String>) {
        let mut holder = self.collapsed_path();
        let target = holder.split_off(self.path.len().saturating_sub(1));
        (holder, target)
    }

    /// Stable name of the object created for the reference under `holder`
    ///
    /// `holder` is the concrete path of the object holding the reference,
    /// with array indices in place of `[]`.
    pub(crate) fn dependency_name(&self, prefix: &str, holder: &[String]) -> String {
        let mut path = holder.to_vec();
        path.push(self.property_name.clone());
        if path.first().is_some_and(|s| s == "entry") {
            path.remove(0);
        }
        dependency_name(prefix, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn openapi(property: &str, type_: &str) -> OpenApiMapping {
        OpenApiMapping {
            property: property.to_string(),
            type_: type_.to_string(),
        }
    }

    #[test]
    fn test_resolve_xpath() {
        assert_eq!(resolve_xpath("$.groupId"), vec!["groupId"]);
        assert_eq!(resolve_xpath(".name"), vec!["name"]);
        assert_eq!(resolve_xpath("status.id"), vec!["status", "id"]);
        assert_eq!(resolve_xpath("$.data.#"), vec!["data", "#"]);
    }

    #[test]
    fn test_collapsed_path() {
        let mapping = Mapping::new(
            ["spec", "v20250312", "entry", "notifications", "[]", "datadogApiKeySecretRef"]
                .map(String::from)
                .to_vec(),
            KubeMapping::default(),
            openapi("$.datadogApiKey", "string"),
        );
        assert_eq!(mapping.property_name(), "datadogApiKeySecretRef");
        assert_eq!(
            mapping.collapsed_path(),
            vec!["spec", "v20250312", "entry", "notifications", "[]", "datadogApiKey"]
        );
        let (holder, target) = mapping.split_collapsed_path();
        assert_eq!(holder, vec!["spec", "v20250312", "entry", "notifications", "[]"]);
        assert_eq!(target, vec!["datadogApiKey"]);
        assert!(!mapping.optional());
    }

    #[test]
    fn test_dependency_name_skips_leading_entry() {
        let mapping = Mapping::new(
            vec!["entry".to_string(), "apiKeyRef".to_string()],
            KubeMapping::default(),
            openapi("$.apiKey", "string"),
        );
        assert_eq!(
            mapping.dependency_name("cfg", &["entry".to_string()]),
            dependency_name("cfg", &["apiKeyRef".to_string()])
        );
    }

    #[test]
    fn test_coerce() {
        assert_eq!(openapi("$.port", "integer").coerce(json!("27017")).unwrap(), json!(27017));
        assert_eq!(openapi("$.ratio", "number").coerce(json!("0.5")).unwrap(), json!(0.5));
        assert_eq!(openapi("$.on", "boolean").coerce(json!("true")).unwrap(), json!(true));
        assert_eq!(openapi("$.id", "string").coerce(json!(42)).unwrap(), json!("42"));
        assert_eq!(openapi("$.id", "string").coerce(json!("abc")).unwrap(), json!("abc"));
        assert_eq!(openapi("$.any", "").coerce(json!({"a": 1})).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_coerce_rejects_garbage() {
        let err = openapi("$.port", "integer").coerce(json!("many")).unwrap_err();
        assert!(err.to_string().contains("cannot convert 'many' to integer"));
        assert!(openapi("$.id", "string").coerce(json!(["a"])).is_err());
    }
}
