//! API response -> custom resource: raw values become references

use crapi_core::{Holder, ObjectMap, base, get_value, holders_mut, join, remove_field, to_object_map};
use serde_json::Value;
use tracing::{debug, trace};

use super::kubeset::Kubeset;
use super::mapping::{Mapping, resolve_xpath};
use crate::error::{CrapiError, Result};

impl Mapping {
    /// Replace the raw values this mapping covers in `object` by references
    ///
    /// Existing dependencies holding the same value are reused; otherwise a
    /// new object is created and registered in the kubeset.
    pub(crate) fn expand(&self, ks: &mut Kubeset<'_>, object: &mut ObjectMap) -> Result<()> {
        let (holder_path, target) = self.split_collapsed_path();
        let holders = match holders_mut(object, &holder_path) {
            Ok(holders) => holders,
            Err(err) if err.is_not_found() => {
                trace!(path = %join(self.path()), "nothing to expand");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        for holder in holders {
            let raw = match get_value(holder.map, &target) {
                Ok(Value::Null) => continue,
                Ok(value) => value.clone(),
                // Array elements do not all carry every field
                Err(err) if err.is_not_found() && holder.via_array => continue,
                Err(err) if err.is_not_found() => {
                    let mut path = holder.path.clone();
                    path.extend(target.iter().cloned());
                    return Err(CrapiError::MissingField { path: join(&path) });
                }
                Err(err) => return Err(err.into()),
            };
            self.expand_value(ks, holder, &target, &raw)?;
        }
        Ok(())
    }

    fn expand_value(
        &self,
        ks: &mut Kubeset<'_>,
        holder: Holder<'_>,
        target: &[String],
        raw: &Value,
    ) -> Result<()> {
        let kube = self.kube_mapping();

        if let Some(name) = self.find_matching_dependency(ks, raw)? {
            debug!(field = %self.property_name(), dependency = %name, "reusing dependency");
            let reference = kube.reference(&name, None)?;
            replace_with_reference(holder, target, self.property_name(), reference);
            return Ok(());
        }

        if !kube.can_create() {
            if self.optional() {
                debug!(
                    field = %self.property_name(),
                    "no dependency matches and {} cannot be created, keeping raw value",
                    kube.type_
                );
                return Ok(());
            }
            return Err(CrapiError::NoMatchingPropertySelector {
                kind: kube.type_.to_string(),
            });
        }

        let name = self.dependency_name(ks.main_name(), &holder.path);
        let key = base(target).to_string();
        let reference = if ks.has(&name) {
            debug!(dependency = %name, "dependency already present");
            kube.reference(&name, Some(&key))?
        } else {
            let resource = ks.scheme().resource_for(&kube.type_)?;
            let text = kube.encode(raw)?;
            let (dependency, key) = kube.build(&resource, &name, ks.main_namespace(), &key, &text)?;
            debug!(dependency = %name, kind = %kube.type_, key = %key, "created dependency");
            ks.add(dependency);
            kube.reference(&name, Some(&key))?
        };
        replace_with_reference(holder, target, self.property_name(), reference);
        Ok(())
    }

    /// Name of a dependency of the mapped type already holding `raw` at one
    /// of the mapping properties
    fn find_matching_dependency(&self, ks: &Kubeset<'_>, raw: &Value) -> Result<Option<String>> {
        let kube = self.kube_mapping();
        if kube.properties.is_empty() {
            return Ok(None);
        }
        for dependency in ks.candidates(&kube.type_) {
            let object = to_object_map(dependency)?;
            for property in &kube.properties {
                match get_value(&object, &resolve_xpath(property)) {
                    Ok(value) if values_match(value, raw) => {
                        return Ok(dependency.metadata.name.clone());
                    }
                    Ok(_) => {}
                    Err(err) if err.is_not_found() => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(None)
    }
}

fn replace_with_reference(holder: Holder<'_>, target: &[String], field: &str, reference: ObjectMap) {
    remove_field(holder.map, target);
    holder.map.insert(field.to_string(), Value::Object(reference));
}

/// Equality that ignores whether a scalar travelled as a string
fn values_match(found: &Value, raw: &Value) -> bool {
    match (found, raw) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            *s == n.to_string()
        }
        (Value::String(s), Value::Bool(b)) | (Value::Bool(b), Value::String(s)) => {
            *s == b.to_string()
        }
        (a, b) => a == b,
    }
}
