//! Discovery of reference mappings in an OpenAPI schema tree

use crapi_core::{ANY_ITEM, error::kind_of, from_value, join};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use super::kube_mapping::{KubeMapping, X_KUBERNETES_MAPPING};
use super::mapping::{Mapping, OpenApiMapping, X_OPENAPI_MAPPING};
use crate::crd::SchemaProperty;
use crate::error::{CrapiError, Result};

/// Collect every mapping below `schema`, which sits at `path`
///
/// Object properties are visited in name order and array items under the
/// `[]` segment. A node carrying both mapping extensions becomes a mapping
/// and is not descended into. A missing schema yields no mappings.
pub fn find_mappings(schema: Option<&SchemaProperty>, path: &[String]) -> Result<Vec<Mapping>> {
    let mut mappings = Vec::new();
    if let Some(schema) = schema {
        walk(schema, path.to_vec(), &mut mappings)?;
    }
    Ok(mappings)
}

fn walk(schema: &SchemaProperty, path: Vec<String>, mappings: &mut Vec<Mapping>) -> Result<()> {
    if let Some(mapping) = extract_mapping(schema, &path)? {
        trace!(path = %join(&path), "found reference mapping");
        mappings.push(mapping);
        return Ok(());
    }

    if let Some(properties) = &schema.properties {
        for (name, property) in properties {
            let mut child = path.clone();
            child.push(name.clone());
            walk(property, child, mappings)?;
        }
    }

    if let Some(items) = &schema.items {
        let mut child = path;
        child.push(ANY_ITEM.to_string());
        walk(items, child, mappings)?;
    }
    Ok(())
}

fn extract_mapping(schema: &SchemaProperty, path: &[String]) -> Result<Option<Mapping>> {
    let (Some(kube), Some(openapi)) = (
        schema.extension(X_KUBERNETES_MAPPING),
        schema.extension(X_OPENAPI_MAPPING),
    ) else {
        return Ok(None);
    };
    let kube: KubeMapping = decode_extension(X_KUBERNETES_MAPPING, kube, path)?;
    let openapi: OpenApiMapping = decode_extension(X_OPENAPI_MAPPING, openapi, path)?;
    Ok(Some(Mapping::new(path.to_vec(), kube, openapi)))
}

fn decode_extension<T: DeserializeOwned>(name: &str, value: &Value, path: &[String]) -> Result<T> {
    if !value.is_object() {
        return Err(CrapiError::Schema(format!(
            "{} at {} must be an object, got {}",
            name,
            join(path),
            kind_of(value)
        )));
    }
    from_value(value.clone())
        .map_err(|e| CrapiError::Schema(format!("failed to parse {} at {}: {}", name, join(path), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdParser;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn alerts_schema() -> SchemaProperty {
        CrdParser::parse_schema_property(&json!({
            "type": "object",
            "properties": {
                "groupRef": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}},
                    "x-kubernetes-mapping": {
                        "nameSelector": ".name",
                        "properties": ["$.status.v20250312.id"],
                        "type": {"group": "atlas.generated.mongodb.com", "version": "v1", "kind": "Group", "resource": "groups"}
                    },
                    "x-openapi-mapping": {"property": "$.groupId", "type": "string"}
                },
                "entry": {
                    "type": "object",
                    "properties": {
                        "notifications": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "webhookSecretSecretRef": {
                                        "type": "object",
                                        "x-kubernetes-mapping": {
                                            "nameSelector": ".name",
                                            "propertySelectors": ["$.data.#"],
                                            "type": {"kind": "Secret", "resource": "secrets", "version": "v1"}
                                        },
                                        "x-openapi-mapping": {"property": ".webhookSecret", "type": "string"}
                                    },
                                    "apiKeySecretRef": {
                                        "type": "object",
                                        "x-kubernetes-mapping": {
                                            "nameSelector": ".name",
                                            "propertySelectors": ["$.data.#"],
                                            "type": {"kind": "Secret", "resource": "secrets", "version": "v1"}
                                        },
                                        "x-openapi-mapping": {"property": ".apiKey", "type": "string"}
                                    },
                                    "onlyHalf": {
                                        "type": "object",
                                        "x-openapi-mapping": {"property": ".half"}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn test_find_mappings_in_order() {
        let schema = alerts_schema();
        let mappings = find_mappings(Some(&schema), &path(&["spec", "v20250312"])).unwrap();

        let paths: Vec<String> = mappings.iter().map(|m| join(m.path())).collect();
        assert_eq!(
            paths,
            vec![
                "spec.v20250312.entry.notifications.[].apiKeySecretRef",
                "spec.v20250312.entry.notifications.[].webhookSecretSecretRef",
                "spec.v20250312.groupRef",
            ]
        );
        assert_eq!(mappings[2].openapi_mapping().target_path(), vec!["groupId"]);
        assert_eq!(mappings[2].kube_mapping().type_.kind, "Group");
        assert!(mappings[0].kube_mapping().can_create());
    }

    #[test]
    fn test_find_mappings_is_deterministic() {
        let schema = alerts_schema();
        let start = path(&["spec", "v20250312"]);
        let first = find_mappings(Some(&schema), &start).unwrap();
        let second = find_mappings(Some(&schema), &start).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mapping_nodes_are_not_descended() {
        let schema = CrdParser::parse_schema_property(&json!({
            "type": "object",
            "x-kubernetes-mapping": {"type": {"kind": "Secret", "version": "v1"}, "propertySelectors": ["$.data.#"]},
            "x-openapi-mapping": {"property": "$.outer"},
            "properties": {
                "inner": {
                    "x-kubernetes-mapping": {"type": {"kind": "Secret", "version": "v1"}},
                    "x-openapi-mapping": {"property": "$.inner"}
                }
            }
        }));
        let mappings = find_mappings(Some(&schema), &path(&["spec", "outerRef"])).unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].property_name(), "outerRef");
    }

    #[test]
    fn test_no_schema() {
        assert!(find_mappings(None, &path(&["spec"])).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_extension_is_fatal() {
        let schema = CrdParser::parse_schema_property(&json!({
            "properties": {
                "groupRef": {
                    "x-kubernetes-mapping": "Group",
                    "x-openapi-mapping": {"property": "$.groupId"}
                }
            }
        }));
        let err = find_mappings(Some(&schema), &path(&["spec", "v1"])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("x-kubernetes-mapping at spec.v1.groupRef must be an object"));

        let schema = CrdParser::parse_schema_property(&json!({
            "properties": {
                "groupRef": {
                    "x-kubernetes-mapping": {"properties": "not-a-list", "type": {}},
                    "x-openapi-mapping": {"property": "$.groupId"}
                }
            }
        }));
        let err = find_mappings(Some(&schema), &path(&["spec", "v1"])).unwrap_err();
        assert!(err.to_string().contains("failed to parse x-kubernetes-mapping at spec.v1.groupRef"));
    }
}
