//! Translator configuration
//!
//! Loaded from YAML:
//!
//! ```yaml
//! crdVersion: v1
//! sdkVersions: [v20250312]
//! mappingsAnnotation: api-mappings
//! pruneUnknownFields: true
//! optionalExpansions: [groupRef]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crd::CrdSchema;
use crate::error::{CrapiError, Result};
use crate::scheme::Scheme;
use crate::translator::{API_MAPPINGS_ANNOTATION, DEFAULT_OPTIONAL_EXPANSIONS, Translator};

/// Which CRD and SDK versions to translate between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorConfig {
    /// CRD version served to users
    #[serde(default = "default_crd_version")]
    pub crd_version: String,

    /// SDK versions, each a `spec.<version>` block of the resource
    #[serde(default)]
    pub sdk_versions: Vec<String>,

    /// Annotation holding the mapping schema
    #[serde(default = "default_mappings_annotation")]
    pub mappings_annotation: String,

    /// Drop fields the CRD does not declare from translated resources
    #[serde(default)]
    pub prune_unknown_fields: bool,

    /// Reference fields that keep their raw value when nothing matches it
    #[serde(default = "default_optional_expansions")]
    pub optional_expansions: Vec<String>,
}

fn default_crd_version() -> String {
    "v1".to_string()
}

fn default_mappings_annotation() -> String {
    API_MAPPINGS_ANNOTATION.to_string()
}

fn default_optional_expansions() -> Vec<String> {
    DEFAULT_OPTIONAL_EXPANSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            crd_version: default_crd_version(),
            sdk_versions: Vec::new(),
            mappings_annotation: default_mappings_annotation(),
            prune_unknown_fields: false,
            optional_expansions: default_optional_expansions(),
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Default SDK version, the first one configured
    pub fn sdk_version(&self) -> Option<&str> {
        self.sdk_versions.first().map(String::as_str)
    }

    /// Build one translator per configured SDK version
    pub fn translators(
        &self,
        scheme: Arc<Scheme>,
        crd: &CrdSchema,
    ) -> Result<BTreeMap<String, Translator>> {
        if self.sdk_versions.is_empty() {
            return Err(CrapiError::InvalidConfig(
                "no SDK versions configured".to_string(),
            ));
        }
        self.sdk_versions
            .iter()
            .map(|version| {
                let translator = Translator::with_annotation(
                    scheme.clone(),
                    crd,
                    &self.crd_version,
                    version,
                    &self.mappings_annotation,
                )?
                .with_optional_expansions(&self.optional_expansions);
                Ok((version.clone(), translator))
            })
            .collect()
    }
}
