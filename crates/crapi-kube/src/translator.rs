//! Translation between custom resources and API objects
//!
//! A custom resource carries one block per SDK version:
//!
//! ```yaml
//! apiVersion: atlas.generated.mongodb.com/v1
//! kind: Group
//! metadata:
//!   name: my-project
//! spec:
//!   v20250312:
//!     entry: {...}        # API request fields
//!     groupRef: {...}     # references, resolved on the way out
//! status:
//!   v20250312: {...}      # API response fields
//! ```
//!
//! [`Translator::to_api`] builds an API request from `spec.<sdk>` and
//! `spec.<sdk>.entry`, resolving references against the supplied
//! dependencies. [`Translator::from_api`] writes an API response into the
//! resource and turns referenced values into references, returning any
//! object it had to create.

use std::collections::BTreeMap;
use std::sync::Arc;

use crapi_core::{
    ObjectMap, copy_fields, from_object_map, from_object_map_into, get_field, get_field_object,
    get_or_create_field, to_object_map,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{api::DynamicObject, core::GroupVersionKind};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::crd::{CrdParser, CrdSchema, OpenApiSchema};
use crate::error::{CrapiError, Result};
use crate::refs::{Mapping, collapse_all, expand_all, find_mappings};
use crate::scheme::Scheme;

/// CRD annotation holding a standalone OpenAPI schema with the mapping
/// extensions
pub const API_MAPPINGS_ANNOTATION: &str = "api-mappings";

/// Field of `spec.<sdk>` mirroring the API request body
const ENTRY: &str = "entry";

/// Reference fields whose raw value stays in place when no dependency
/// matches it
pub const DEFAULT_OPTIONAL_EXPANSIONS: &[&str] = &["groupRef"];

/// Translator for one CRD version and one SDK version
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Translator {
    scheme: Arc<Scheme>,
    gvk: GroupVersionKind,
    sdk_version: String,
    mappings: Vec<Mapping>,
    schema: Option<OpenApiSchema>,
}

impl Translator {
    /// Build a translator, compiling the reference mappings of `crd`
    ///
    /// Fails when the CRD lacks `crd_version` or when that version does not
    /// declare `spec.<sdk_version>`.
    pub fn new(
        scheme: Arc<Scheme>,
        crd: &CrdSchema,
        crd_version: &str,
        sdk_version: &str,
    ) -> Result<Self> {
        Self::with_annotation(scheme, crd, crd_version, sdk_version, API_MAPPINGS_ANNOTATION)
    }

    /// Like [`Translator::new`], reading mappings from a custom annotation
    pub fn with_annotation(
        scheme: Arc<Scheme>,
        crd: &CrdSchema,
        crd_version: &str,
        sdk_version: &str,
        annotation: &str,
    ) -> Result<Self> {
        let version = crd
            .version(crd_version)
            .ok_or_else(|| CrapiError::UnknownCrdVersion {
                kind: crd.names.kind.clone(),
                version: crd_version.to_string(),
            })?;
        if !version.has_sdk_version(sdk_version) {
            return Err(CrapiError::MissingSdkVersion {
                kind: crd.names.kind.clone(),
                version: sdk_version.to_string(),
            });
        }

        let mapping_schema = match crd.annotation(annotation).filter(|s| !s.trim().is_empty()) {
            Some(yaml) => {
                let value: Value = serde_yaml::from_str(yaml).map_err(|e| {
                    CrapiError::Schema(format!("failed to parse '{}' annotation: {}", annotation, e))
                })?;
                Some(CrdParser::parse_openapi_schema(&value))
            }
            None => version.schema.clone(),
        };
        let sdk_schema = mapping_schema
            .as_ref()
            .and_then(|s| s.property("spec"))
            .and_then(|spec| spec.property(sdk_version));
        let mappings = find_mappings(sdk_schema, &["spec".to_string(), sdk_version.to_string()])?
            .into_iter()
            .map(|m| {
                let optional = DEFAULT_OPTIONAL_EXPANSIONS.contains(&m.property_name());
                m.with_optional(optional)
            })
            .collect::<Vec<_>>();

        debug!(
            kind = %crd.names.kind,
            crd_version,
            sdk_version,
            mappings = mappings.len(),
            "compiled translator"
        );

        Ok(Self {
            scheme,
            gvk: GroupVersionKind::gvk(&crd.group, crd_version, &crd.names.kind),
            sdk_version: sdk_version.to_string(),
            mappings,
            schema: version.schema.clone(),
        })
    }

    /// One translator per SDK version of the same CRD version
    pub fn per_version<S: AsRef<str>>(
        scheme: Arc<Scheme>,
        crd: &CrdSchema,
        crd_version: &str,
        versions: &[S],
    ) -> Result<BTreeMap<String, Translator>> {
        versions
            .iter()
            .map(|v| {
                let translator = Self::new(scheme.clone(), crd, crd_version, v.as_ref())?;
                Ok((v.as_ref().to_string(), translator))
            })
            .collect()
    }

    /// Replace the set of reference fields expanded optionally
    ///
    /// Expanding any other mapping fails when no dependency holds the raw
    /// value and the mapping cannot create one.
    pub fn with_optional_expansions<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.mappings = self
            .mappings
            .into_iter()
            .map(|m| {
                let optional = fields.iter().any(|f| f.as_ref() == m.property_name());
                m.with_optional(optional)
            })
            .collect();
        self
    }

    /// Reference mappings, in schema order
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn sdk_version(&self) -> &str {
        &self.sdk_version
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Build an API request from a custom resource
    pub fn to_api<T, S>(&self, source: &S, deps: &[DynamicObject]) -> Result<T>
    where
        T: DeserializeOwned,
        S: Serialize + ?Sized,
    {
        let mut source = to_object_map(source)?;
        self.check_kind(&source)?;
        let main = main_metadata(&source)?;

        collapse_all(&self.scheme, &self.mappings, &main, deps, &mut source)?;

        let versioned = get_field_object(&source, &["spec", self.sdk_version.as_str()])?;
        let mut request = ObjectMap::new();
        copy_fields(&mut request, versioned);
        if let Some(Value::Object(entry)) = request.remove(ENTRY) {
            copy_fields(&mut request, &entry);
        }
        Ok(from_object_map(request)?)
    }

    /// Write an API response into a custom resource
    ///
    /// The response lands in `spec.<sdk>`, `spec.<sdk>.entry` and
    /// `status.<sdk>`. Returns the objects created for references; the
    /// caller persists them.
    pub fn from_api<T, S>(
        &self,
        target: &mut T,
        source: &S,
        deps: &[DynamicObject],
    ) -> Result<Vec<DynamicObject>>
    where
        T: Serialize + DeserializeOwned,
        S: Serialize + ?Sized,
    {
        let source = to_object_map(source)?;
        let mut object = to_object_map(target)?;
        self.check_kind(&object)?;

        let spec = get_or_create_field(&mut object, ObjectMap::new(), &["spec", self.sdk_version.as_str()])?;
        copy_fields(spec, &source);
        spec.insert(ENTRY.to_string(), Value::Object(source.clone()));
        let status = get_or_create_field(&mut object, ObjectMap::new(), &["status", self.sdk_version.as_str()])?;
        copy_fields(status, &source);

        let main = main_metadata(&object)?;
        let added = expand_all(&self.scheme, &self.mappings, &main, deps, &mut object)?;

        from_object_map_into(target, object)?;
        Ok(added)
    }

    /// Drop fields the CRD version schema does not declare
    pub fn prune(&self, object: &mut ObjectMap) {
        if let Some(schema) = &self.schema {
            schema.prune(object);
        }
    }

    fn check_kind(&self, object: &ObjectMap) -> Result<()> {
        let text = |key: &str| object.get(key).and_then(Value::as_str).unwrap_or_default();
        let expected = describe(&self.gvk);
        let actual = self
            .scheme
            .infer_kind(text("apiVersion"), text("kind"))
            .map_err(|_| CrapiError::KindMismatch {
                expected: expected.clone(),
                found: "an object of unknown kind".to_string(),
            })?;
        if actual != self.gvk {
            return Err(CrapiError::KindMismatch {
                expected,
                found: describe(&actual),
            });
        }
        Ok(())
    }
}

fn describe(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        format!("{}/{}", gvk.version, gvk.kind)
    } else {
        format!("{}/{}/{}", gvk.group, gvk.version, gvk.kind)
    }
}

fn main_metadata(object: &ObjectMap) -> Result<ObjectMeta> {
    match get_field(object, &["metadata"]) {
        Ok(meta) => Ok(meta),
        Err(err) if err.is_not_found() => Ok(ObjectMeta::default()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GROUP_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: groups.atlas.generated.mongodb.com
spec:
  group: atlas.generated.mongodb.com
  scope: Namespaced
  names:
    kind: Group
    plural: groups
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                v20250312:
                  type: object
                  properties:
                    entry:
                      type: object
                      properties:
                        name:
                          type: string
                        orgId:
                          type: string
                    projectOwnerId:
                      type: string
            status:
              type: object
              properties:
                v20250312:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
"#;

    fn translator() -> Translator {
        let crd = CrdParser::parse(GROUP_CRD).unwrap();
        Translator::new(Arc::new(Scheme::with_core_types()), &crd, "v1", "v20250312").unwrap()
    }

    #[test]
    fn test_translator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Translator>();
    }

    #[test]
    fn test_unknown_versions() {
        let crd = CrdParser::parse(GROUP_CRD).unwrap();
        let scheme = Arc::new(Scheme::new());

        let err = Translator::new(scheme.clone(), &crd, "v2", "v20250312").unwrap_err();
        assert!(matches!(err, CrapiError::UnknownCrdVersion { .. }));

        let err = Translator::new(scheme, &crd, "v1", "v20231115").unwrap_err();
        assert!(matches!(err, CrapiError::MissingSdkVersion { .. }));
    }

    #[test]
    fn test_to_api_merges_entry() {
        let tr = translator();
        let cr = json!({
            "apiVersion": "atlas.generated.mongodb.com/v1",
            "kind": "Group",
            "metadata": {"name": "my-project", "namespace": "atlas"},
            "spec": {"v20250312": {
                "projectOwnerId": "owner",
                "entry": {"name": "test-project", "orgId": "6098765432109876"}
            }}
        });

        let request: Value = tr.to_api(&cr, &[]).unwrap();
        assert_eq!(
            request,
            json!({"projectOwnerId": "owner", "name": "test-project", "orgId": "6098765432109876"})
        );
    }

    #[test]
    fn test_to_api_rejects_other_kinds() {
        let tr = translator();
        let cr = json!({
            "apiVersion": "atlas.generated.mongodb.com/v1",
            "kind": "Cluster",
            "spec": {"v20250312": {}}
        });
        let err = tr.to_api::<Value, _>(&cr, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource must be a atlas.generated.mongodb.com/v1/Group but got atlas.generated.mongodb.com/v1/Cluster"
        );
    }

    #[test]
    fn test_from_api_fills_spec_and_status() {
        let tr = translator();
        let mut cr = json!({
            "apiVersion": "atlas.generated.mongodb.com/v1",
            "kind": "Group",
            "metadata": {"name": "my-project"},
            "spec": {"v20250312": {"projectOwnerId": "owner"}}
        });
        let response = json!({"id": "62b6e34b", "name": "test-project", "clusterCount": 0});

        let added = tr.from_api(&mut cr, &response, &[]).unwrap();
        assert!(added.is_empty());

        assert_eq!(cr["spec"]["v20250312"]["projectOwnerId"], "owner");
        assert_eq!(cr["spec"]["v20250312"]["entry"]["name"], "test-project");
        assert_eq!(cr["status"]["v20250312"]["id"], "62b6e34b");

        let mut object = match cr {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        tr.prune(&mut object);
        assert_eq!(
            Value::Object(object),
            json!({
                "apiVersion": "atlas.generated.mongodb.com/v1",
                "kind": "Group",
                "metadata": {"name": "my-project"},
                "spec": {"v20250312": {
                    "projectOwnerId": "owner",
                    "entry": {"name": "test-project"}
                }},
                "status": {"v20250312": {"id": "62b6e34b", "name": "test-project", "clusterCount": 0}}
            })
        );
    }

    #[test]
    fn test_per_version() {
        let crd = CrdParser::parse(GROUP_CRD).unwrap();
        let scheme = Arc::new(Scheme::with_core_types());

        let translators = Translator::per_version(scheme.clone(), &crd, "v1", &["v20250312"]).unwrap();
        assert_eq!(translators["v20250312"].sdk_version(), "v20250312");
        assert!(translators["v20250312"].mappings().is_empty());

        assert!(Translator::per_version(scheme, &crd, "v1", &["v20250312", "v20231115"]).is_err());
    }
}
