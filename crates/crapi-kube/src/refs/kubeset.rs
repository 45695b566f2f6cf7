//! Per-call working set of Kubernetes objects

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use tracing::{debug, trace};

use super::kube_mapping::KubeType;
use crate::scheme::Scheme;

/// The main object, the dependencies supplied with it, and the objects
/// created while expanding
pub struct Kubeset<'a> {
    scheme: &'a Scheme,
    main: &'a ObjectMeta,
    deps: &'a [DynamicObject],
    added: Vec<DynamicObject>,
}

impl<'a> Kubeset<'a> {
    pub fn new(scheme: &'a Scheme, main: &'a ObjectMeta, deps: &'a [DynamicObject]) -> Self {
        Self {
            scheme,
            main,
            deps,
            added: Vec::new(),
        }
    }

    pub fn scheme(&self) -> &'a Scheme {
        self.scheme
    }

    /// Name of the main object, the prefix of generated names
    pub fn main_name(&self) -> &str {
        self.main.name.as_deref().unwrap_or_default()
    }

    pub fn main_namespace(&self) -> Option<&str> {
        self.main.namespace.as_deref()
    }

    /// Supplied dependencies followed by added objects
    pub fn objects(&self) -> impl Iterator<Item = &DynamicObject> {
        self.deps.iter().chain(self.added.iter())
    }

    /// Check whether an object with this name is known
    pub fn has(&self, name: &str) -> bool {
        self.objects()
            .any(|obj| obj.metadata.name.as_deref() == Some(name))
    }

    /// Objects of the given type
    ///
    /// Objects whose kind cannot be determined are skipped.
    pub fn candidates<'s>(&'s self, ty: &'s KubeType) -> impl Iterator<Item = &'s DynamicObject> + 's {
        self.objects()
            .filter(move |obj| match self.scheme.object_kind(obj) {
                Ok(gvk) => ty.matches(&gvk),
                Err(err) => {
                    debug!(
                        name = obj.metadata.name.as_deref().unwrap_or_default(),
                        error = %err,
                        "skipping dependency of unknown kind"
                    );
                    false
                }
            })
    }

    /// Object of the given type and name
    ///
    /// Objects without type meta that the scheme cannot place are matched by
    /// name alone; only a known, different kind rules an object out.
    pub fn find(&self, name: &str, ty: &KubeType) -> Option<&DynamicObject> {
        self.objects()
            .filter(|obj| obj.metadata.name.as_deref() == Some(name))
            .find(|obj| match self.scheme.object_kind(obj) {
                Ok(gvk) => ty.matches(&gvk),
                Err(_) => {
                    trace!(name, "matching dependency of unknown kind by name");
                    true
                }
            })
    }

    pub fn add(&mut self, object: DynamicObject) {
        self.added.push(object);
    }

    pub fn into_added(self) -> Vec<DynamicObject> {
        self.added
    }
}
