//! Shared input and output helpers for CLI commands

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crapi_kube::{CrdParser, CrdSchema, Scheme, Translator, TranslatorConfig, find_by_kind};
use kube::api::DynamicObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CliError, Result};

/// Version selection shared by the translating commands
#[derive(Debug, Clone, Default)]
pub struct VersionArgs {
    pub config: Option<PathBuf>,
    pub crd_version: Option<String>,
    pub sdk_version: Option<String>,
}

impl VersionArgs {
    /// Configuration file merged with command line overrides
    pub fn resolve(&self) -> Result<TranslatorConfig> {
        let mut config = match &self.config {
            Some(path) => TranslatorConfig::load_from(path).map_err(|e| {
                CliError::input(format!("failed to load config {}: {}", path.display(), e))
            })?,
            None => TranslatorConfig::default(),
        };
        if let Some(version) = &self.crd_version {
            config.crd_version = version.clone();
        }
        if let Some(version) = &self.sdk_version {
            config.sdk_versions = vec![version.clone()];
        }
        if config.sdk_versions.is_empty() {
            return Err(CliError::input_with_help(
                "no SDK version selected",
                "pass --sdk-version, set CRAPI_SDK_VERSION or list sdkVersions in the config file",
            ));
        }
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::Io {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Every CRD found in the given files
pub fn load_crds(paths: &[PathBuf]) -> Result<Vec<CrdSchema>> {
    let mut crds = Vec::new();
    for path in paths {
        let parsed = CrdParser::parse_all(&read_file(path)?)
            .map_err(|e| CliError::crd(format!("{}: {}", path.display(), e)))?;
        debug!(file = %path.display(), count = parsed.len(), "loaded CRDs");
        crds.extend(parsed);
    }
    if crds.is_empty() {
        return Err(CliError::crd("no CustomResourceDefinition found in the given files"));
    }
    Ok(crds)
}

/// Core types plus every CRD kind
pub fn build_scheme(crds: &[CrdSchema]) -> Scheme {
    let mut scheme = Scheme::with_core_types();
    for crd in crds {
        scheme.register_crd(crd);
    }
    scheme
}

/// The CRD for `kind`, or the only one loaded when no kind is given
pub fn select_crd<'a>(crds: &'a [CrdSchema], kind: Option<&str>) -> Result<&'a CrdSchema> {
    let known = || {
        crds.iter()
            .map(|c| c.names.kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    match kind {
        Some(kind) => find_by_kind(crds, kind).ok_or_else(|| {
            CliError::crd_with_help(
                format!("no CRD for kind '{}'", kind),
                format!("loaded kinds: {}", known()),
            )
        }),
        None if crds.len() == 1 => Ok(&crds[0]),
        None => Err(CliError::crd_with_help(
            "several CRDs loaded and no kind selected",
            format!("pass --kind, one of: {}", known()),
        )),
    }
}

/// Translator for the selected CRD and the first configured SDK version
pub fn build_translator(
    scheme: Scheme,
    crd: &CrdSchema,
    config: &TranslatorConfig,
) -> Result<Translator> {
    let mut translators = config.translators(Arc::new(scheme), crd)?;
    let version = config
        .sdk_version()
        .ok_or_else(|| CliError::internal("SDK version vanished from configuration"))?;
    translators
        .remove(version)
        .ok_or_else(|| CliError::internal(format!("no translator built for {}", version)))
}

/// A single YAML or JSON document
pub fn load_document(path: &Path) -> Result<Value> {
    let value: Value = serde_yaml::from_str(&read_file(path)?)
        .map_err(|e| CliError::input(format!("{}: {}", path.display(), e)))?;
    if !value.is_object() {
        return Err(CliError::input(format!(
            "{}: expected an object at the top level",
            path.display()
        )));
    }
    Ok(value)
}

/// Kubernetes objects from multi-document YAML files
///
/// `List` documents, as printed by `kubectl get -o yaml`, are flattened into
/// their items. Empty documents are skipped.
pub fn load_dependencies(paths: &[PathBuf]) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for path in paths {
        let content = read_file(path)?;
        for document in serde_yaml::Deserializer::from_str(&content) {
            let value = Value::deserialize(document)
                .map_err(|e| CliError::input(format!("{}: {}", path.display(), e)))?;
            collect_objects(path, value, &mut objects)?;
        }
    }
    debug!(count = objects.len(), "loaded dependencies");
    Ok(objects)
}

fn collect_objects(path: &Path, value: Value, out: &mut Vec<DynamicObject>) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let is_list = value
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.ends_with("List"));
    if is_list {
        if let Some(Value::Array(items)) = value.get("items") {
            for item in items.clone() {
                collect_objects(path, item, out)?;
            }
            return Ok(());
        }
    }
    let object: DynamicObject = serde_json::from_value(value)
        .map_err(|e| CliError::input(format!("{}: not a Kubernetes object: {}", path.display(), e)))?;
    if object.types.is_none() {
        return Err(CliError::input(format!(
            "{}: object {} has no apiVersion/kind",
            path.display(),
            object.metadata.name.as_deref().unwrap_or("<unnamed>")
        )));
    }
    out.push(object);
    Ok(())
}

/// Print a value as pretty JSON or as YAML
pub fn print_value<T: Serialize>(value: &T, json: bool) -> Result<()> {
    let text = if json {
        serde_json::to_string_pretty(value).map_err(|e| CliError::internal(e.to_string()))?
    } else {
        serde_yaml::to_string(value).map_err(|e| CliError::internal(e.to_string()))?
    };
    println!("{}", text.trim_end());
    Ok(())
}
