//! Reference mappings between custom resources and API objects
//!
//! A CRD schema marks reference fields with two extensions:
//!
//! ```yaml
//! groupRef:
//!   type: object
//!   x-kubernetes-mapping:
//!     nameSelector: .name
//!     properties: [$.status.v20250312.id]
//!     type: {group: atlas.generated.mongodb.com, version: v1, kind: Group, resource: groups}
//!   x-openapi-mapping:
//!     property: $.groupId
//!     type: string
//! ```
//!
//! [`find_mappings`] compiles them into [`Mapping`]s. [`expand_all`] turns
//! raw API values into references (creating Secrets and the like on the
//! way), and [`collapse_all`] resolves references back into raw values.

mod collapse;
mod expand;
mod kube_mapping;
mod kubeset;
mod mapping;
mod names;
mod walker;

use crapi_core::{ObjectMap, join};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;

use crate::error::Result;
use crate::scheme::Scheme;

pub use kube_mapping::{KubeMapping, KubeType, X_KUBERNETES_MAPPING};
pub use kubeset::Kubeset;
pub use mapping::{Mapping, OpenApiMapping, X_OPENAPI_MAPPING, resolve_xpath};
pub use names::dependency_name;
pub use walker::find_mappings;

/// Field of a reference record holding the key inside the referenced object
pub const REF_KEY: &str = "key";

/// Expand every mapping over `object`, in order
///
/// Returns the objects created on the way; the caller persists them.
pub fn expand_all(
    scheme: &Scheme,
    mappings: &[Mapping],
    main: &ObjectMeta,
    deps: &[DynamicObject],
    object: &mut ObjectMap,
) -> Result<Vec<DynamicObject>> {
    let mut ks = Kubeset::new(scheme, main, deps);
    for mapping in mappings {
        mapping
            .expand(&mut ks, object)
            .map_err(|e| e.at_field(join(mapping.path())))?;
    }
    Ok(ks.into_added())
}

/// Collapse every mapping over `object`, in order
pub fn collapse_all(
    scheme: &Scheme,
    mappings: &[Mapping],
    main: &ObjectMeta,
    deps: &[DynamicObject],
    object: &mut ObjectMap,
) -> Result<()> {
    let ks = Kubeset::new(scheme, main, deps);
    for mapping in mappings {
        mapping
            .collapse(&ks, object)
            .map_err(|e| e.at_field(join(mapping.path())))?;
    }
    Ok(())
}
