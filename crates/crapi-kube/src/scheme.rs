//! Registry of known Kubernetes resource types
//!
//! Dependencies handed to the translator do not always carry their
//! `apiVersion`/`kind`. The registry fills the gap by kind, and tells the
//! expand step which `ApiResource` to build new objects from.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{
    Resource,
    api::DynamicObject,
    core::{ApiResource, GroupVersionKind},
};
use tracing::trace;

use crate::crd::CrdSchema;
use crate::error::{CrapiError, Result};
use crate::refs::KubeType;

/// Known resource types, in registration order
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    resources: Vec<ApiResource>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme knowing the core types references usually point at
    pub fn with_core_types() -> Self {
        let mut scheme = Self::new();
        scheme.register::<Secret>().register::<ConfigMap>();
        scheme
    }

    /// Register a statically typed resource
    pub fn register<K: Resource<DynamicType = ()>>(&mut self) -> &mut Self {
        self.register_resource(ApiResource::erase::<K>(&()))
    }

    /// Register a resource; a second registration of the same type is ignored
    pub fn register_resource(&mut self, resource: ApiResource) -> &mut Self {
        let known = self
            .resources
            .iter()
            .any(|r| r.api_version == resource.api_version && r.kind == resource.kind);
        if !known {
            trace!(api_version = %resource.api_version, kind = %resource.kind, "registered resource type");
            self.resources.push(resource);
        }
        self
    }

    /// Register every served version of a CRD
    pub fn register_crd(&mut self, crd: &CrdSchema) -> &mut Self {
        for version in crd.served_versions() {
            let gvk = GroupVersionKind::gvk(&crd.group, &version.name, &crd.names.kind);
            self.register_resource(ApiResource::from_gvk_with_plural(&gvk, &crd.names.plural));
        }
        self
    }

    pub fn resources(&self) -> &[ApiResource] {
        &self.resources
    }

    /// First registered type with the given kind
    pub fn lookup_kind(&self, kind: &str) -> Option<&ApiResource> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Resolve the GVK of an object from its type meta
    ///
    /// A complete `apiVersion`/`kind` pair is taken as is. A bare kind is
    /// looked up in the registry. Anything else is not registered.
    pub fn infer_kind(&self, api_version: &str, kind: &str) -> Result<GroupVersionKind> {
        if kind.is_empty() {
            return Err(CrapiError::NotRegistered {
                kind: "<unset>".to_string(),
            });
        }
        if !api_version.is_empty() {
            return Ok(gvk_from_api_version(api_version, kind));
        }
        self.lookup_kind(kind)
            .map(|r| GroupVersionKind::gvk(&r.group, &r.version, &r.kind))
            .ok_or_else(|| CrapiError::NotRegistered {
                kind: kind.to_string(),
            })
    }

    /// Resolve the GVK of a dynamic object
    pub fn object_kind(&self, object: &DynamicObject) -> Result<GroupVersionKind> {
        let (api_version, kind) = object
            .types
            .as_ref()
            .map(|t| (t.api_version.as_str(), t.kind.as_str()))
            .unwrap_or_default();
        self.infer_kind(api_version, kind)
    }

    /// The `ApiResource` new objects of a mapping type are created from
    pub fn resource_for(&self, ty: &KubeType) -> Result<ApiResource> {
        let registered = self.resources.iter().find(|r| {
            let same_name = if ty.kind.is_empty() {
                !ty.resource.is_empty() && r.plural == ty.resource
            } else {
                r.kind == ty.kind
            };
            same_name && r.group == ty.group && (ty.version.is_empty() || r.version == ty.version)
        });
        if let Some(resource) = registered {
            return Ok(resource.clone());
        }
        if ty.kind.is_empty() || ty.version.is_empty() {
            return Err(CrapiError::NotRegistered {
                kind: ty.to_string(),
            });
        }
        let gvk = GroupVersionKind::gvk(&ty.group, &ty.version, &ty.kind);
        Ok(if ty.resource.is_empty() {
            ApiResource::from_gvk(&gvk)
        } else {
            ApiResource::from_gvk_with_plural(&gvk, &ty.resource)
        })
    }
}

/// Split an apiVersion into group and version:
/// - "atlas.generated.mongodb.com/v1" -> group="atlas.generated.mongodb.com", version="v1"
/// - "v1" -> group="", version="v1" (core API)
pub fn gvk_from_api_version(api_version: &str, kind: &str) -> GroupVersionKind {
    let (group, version) = api_version.rsplit_once('/').unwrap_or(("", api_version));
    GroupVersionKind::gvk(group, version, kind)
}
