//! From-API command - write an API response into a custom resource

use crapi_core::ObjectMap;
use kube::api::DynamicObject;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CliError, Result};
use crate::util::{
    VersionArgs, build_scheme, build_translator, load_crds, load_dependencies, load_document,
    print_value, select_crd,
};

/// Translated resource and the objects created for it
#[derive(Serialize)]
struct FromApiOutput {
    resource: ObjectMap,
    created: Vec<DynamicObject>,
}

pub fn run(
    crds: &[PathBuf],
    resource: &Path,
    response: &Path,
    deps: &[PathBuf],
    versions: &VersionArgs,
    prune: bool,
    json: bool,
) -> Result<()> {
    let crds = load_crds(crds)?;
    let resource = load_document(resource)?;
    let response = load_document(response)?;
    let crd = select_crd(&crds, resource.get("kind").and_then(Value::as_str))?;
    let config = versions.resolve()?;
    let translator = build_translator(build_scheme(&crds), crd, &config)?;
    let deps = load_dependencies(deps)?;

    let mut object = match resource {
        Value::Object(map) => map,
        _ => return Err(CliError::internal("resource is not an object")),
    };
    let created = translator.from_api(&mut object, &response, &deps)?;
    if prune || config.prune_unknown_fields {
        translator.prune(&mut object);
    }
    info!(
        kind = %crd.names.kind,
        sdk_version = translator.sdk_version(),
        created = created.len(),
        "translated API response into resource"
    );

    if json {
        return print_value(
            &FromApiOutput {
                resource: object,
                created,
            },
            true,
        );
    }

    // One YAML stream, ready for kubectl apply
    print_value(&object, false)?;
    for dependency in &created {
        println!("---");
        print_value(dependency, false)?;
    }
    Ok(())
}
