//! Mappings command - list the reference mappings compiled from a CRD

use console::style;
use std::path::PathBuf;

use crate::error::Result;
use crate::util::{VersionArgs, build_scheme, build_translator, load_crds, print_value, select_crd};

pub fn run(crds: &[PathBuf], kind: Option<&str>, versions: &VersionArgs, json: bool) -> Result<()> {
    let crds = load_crds(crds)?;
    let crd = select_crd(&crds, kind)?;
    let config = versions.resolve()?;
    let translator = build_translator(build_scheme(&crds), crd, &config)?;

    if json {
        return print_value(&translator.mappings(), true);
    }

    println!(
        "{} {} ({}, SDK {})",
        style("Mappings").cyan().bold(),
        crd.names.kind,
        config.crd_version,
        translator.sdk_version()
    );
    println!();

    if translator.mappings().is_empty() {
        println!("  {}", style("no reference fields").dim());
        return Ok(());
    }

    for mapping in translator.mappings() {
        let kube = mapping.kube_mapping();
        let openapi = mapping.openapi_mapping();
        println!("  {}", style(mapping.path().join(".")).bold());
        println!(
            "    {} {} -> {}",
            style("api").dim(),
            mapping.collapsed_path().join("."),
            openapi.type_
        );
        let note = if kube.can_create() {
            " (created on demand)"
        } else if mapping.optional() {
            " (optional)"
        } else {
            ""
        };
        println!("    {} {}{}", style("ref").dim(), kube.type_, note);
    }
    println!();
    println!("{} mapping(s)", translator.mappings().len());

    Ok(())
}
