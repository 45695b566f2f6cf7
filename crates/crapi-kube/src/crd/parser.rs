//! CRD YAML parser
//!
//! Parses CustomResourceDefinition manifests into a structured `CrdSchema`.
//! Works on `serde_json::Value` so that vendor extensions (`x-*` keys) on
//! schema nodes survive parsing.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::schema::{CrdNames, CrdSchema, CrdVersionSchema, OpenApiSchema, SchemaProperty};
use crate::error::{CrapiError, Result};

const CRD_KIND: &str = "CustomResourceDefinition";

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| CrapiError::Serialization(format!("Invalid CRD YAML: {}", e)))?;

        Self::parse_value(&value)
    }

    /// Parse every CRD in a multi-document YAML stream
    ///
    /// Documents of other kinds and empty documents are skipped.
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(document)
                .map_err(|e| CrapiError::Serialization(format!("Invalid CRD YAML: {}", e)))?;
            match value.get("kind").and_then(Value::as_str) {
                Some(CRD_KIND) => crds.push(Self::parse_value(&value)?),
                Some(kind) => debug!(kind, "skipping non-CRD document"),
                None => {}
            }
        }
        Ok(crds)
    }

    /// Parse from a serde_json::Value
    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CrapiError::InvalidConfig("Missing 'kind' field".to_string()))?;

        if kind != CRD_KIND {
            return Err(CrapiError::InvalidConfig(format!(
                "Expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let annotations = value
            .get("metadata")
            .and_then(|m| m.get("annotations"))
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let spec = value
            .get("spec")
            .ok_or_else(|| CrapiError::InvalidConfig("Missing 'spec' field".to_string()))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| CrapiError::InvalidConfig("Missing 'spec.group' field".to_string()))?
            .to_string();

        let names = Self::parse_names(spec.get("names"))?;
        let versions = Self::parse_versions(spec.get("versions"))?;

        Ok(CrdSchema {
            group,
            names,
            versions,
            annotations,
        })
    }

    fn parse_names(names_value: Option<&Value>) -> Result<CrdNames> {
        let names = names_value
            .ok_or_else(|| CrapiError::InvalidConfig("Missing 'spec.names' field".to_string()))?;

        let text = |key: &str| {
            names
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .ok_or_else(|| CrapiError::InvalidConfig(format!("Missing 'spec.names.{}' field", key)))
        };

        Ok(CrdNames {
            kind: text("kind")?,
            plural: text("plural")?,
        })
    }

    fn parse_versions(versions_value: Option<&Value>) -> Result<Vec<CrdVersionSchema>> {
        let versions = versions_value
            .and_then(Value::as_array)
            .ok_or_else(|| CrapiError::InvalidConfig("Missing 'spec.versions' array".to_string()))?;

        versions.iter().map(Self::parse_version).collect()
    }

    fn parse_version(version: &Value) -> Result<CrdVersionSchema> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CrapiError::InvalidConfig("Version missing 'name' field".to_string()))?
            .to_string();

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(Self::parse_openapi_schema);

        Ok(CrdVersionSchema {
            served: version.get("served").and_then(Value::as_bool).unwrap_or(true),
            name,
            schema,
        })
    }

    /// Parse an OpenAPI v3 schema root
    ///
    /// Also used for the standalone schema carried by the `api-mappings`
    /// annotation.
    pub fn parse_openapi_schema(schema: &Value) -> OpenApiSchema {
        OpenApiSchema {
            properties: Self::parse_properties(schema).unwrap_or_default(),
            x_preserve_unknown: preserves_unknown(schema),
        }
    }

    /// Parse a single schema node and everything below it
    pub fn parse_schema_property(prop: &Value) -> SchemaProperty {
        // Kept verbatim: the mapping extensions are decoded later, where a
        // malformed payload can be reported with its path.
        let extensions = prop
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(k, _)| k.starts_with("x-"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        SchemaProperty {
            properties: Self::parse_properties(prop),
            items: prop
                .get("items")
                .map(|v| Box::new(Self::parse_schema_property(v))),
            x_preserve_unknown: preserves_unknown(prop),
            extensions,
        }
    }

    fn parse_properties(node: &Value) -> Option<BTreeMap<String, SchemaProperty>> {
        node.get("properties").and_then(Value::as_object).map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), Self::parse_schema_property(v)))
                .collect()
        })
    }
}

fn preserves_unknown(node: &Value) -> bool {
    node.get("x-kubernetes-preserve-unknown-fields")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Find the CRD defining `kind` among parsed documents
pub fn find_by_kind<'a>(crds: &'a [CrdSchema], kind: &str) -> Option<&'a CrdSchema> {
    crds.iter().find(|crd| crd.names.kind == kind)
}
