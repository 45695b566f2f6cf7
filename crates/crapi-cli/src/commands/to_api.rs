//! To-API command - build an API request from a custom resource

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::util::{
    VersionArgs, build_scheme, build_translator, load_crds, load_dependencies, load_document,
    print_value, select_crd,
};

pub fn run(
    crds: &[PathBuf],
    resource: &Path,
    deps: &[PathBuf],
    versions: &VersionArgs,
    json: bool,
) -> Result<()> {
    let crds = load_crds(crds)?;
    let resource = load_document(resource)?;
    let crd = select_crd(&crds, resource.get("kind").and_then(Value::as_str))?;
    let config = versions.resolve()?;
    let translator = build_translator(build_scheme(&crds), crd, &config)?;
    let deps = load_dependencies(deps)?;

    let request: Value = translator.to_api(&resource, &deps)?;
    info!(
        kind = %crd.names.kind,
        sdk_version = translator.sdk_version(),
        "translated resource to API request"
    );

    print_value(&request, json)
}
