//! Custom resource -> API request: references become raw values

use crapi_core::{ObjectMap, base, holders_mut, join, set_field};
use serde_json::Value;
use tracing::trace;

use super::REF_KEY;
use super::kubeset::Kubeset;
use super::mapping::Mapping;
use crate::error::{CrapiError, Result};

impl Mapping {
    /// Resolve the references this mapping covers in `object`, writing the
    /// referenced values at the API target path next to each reference
    pub(crate) fn collapse(&self, ks: &Kubeset<'_>, object: &mut ObjectMap) -> Result<()> {
        let (holder_path, target) = self.split_collapsed_path();
        let holders = match holders_mut(object, &holder_path) {
            Ok(holders) => holders,
            Err(err) if err.is_not_found() => {
                trace!(path = %join(self.path()), "nothing to collapse");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        for holder in holders {
            let value = match holder.map.get(self.property_name()) {
                Some(Value::Object(reference)) if !reference.is_empty() => {
                    self.resolve(ks, reference, base(&target))?
                }
                _ => continue,
            };
            let value = self.openapi_mapping().coerce(value)?;
            set_field(holder.map, &target, value)?;
        }
        Ok(())
    }

    fn resolve(&self, ks: &Kubeset<'_>, reference: &ObjectMap, default_key: &str) -> Result<Value> {
        let kube = self.kube_mapping();
        let key = match reference.get(REF_KEY) {
            Some(Value::String(key)) if !key.is_empty() => key.as_str(),
            _ => default_key,
        };
        let name = kube.referenced_name(reference)?;
        let dependency =
            ks.find(name, &kube.type_)
                .ok_or_else(|| CrapiError::DependencyNotFound {
                    kind: kube.type_.to_string(),
                    name: name.to_string(),
                })?;
        kube.fetch(dependency, key)
    }
}
