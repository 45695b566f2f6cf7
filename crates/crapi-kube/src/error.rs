//! Error types for crapi-kube

use crapi_core::ObjMapError;
use thiserror::Error;

/// Result type for crapi-kube operations
pub type Result<T> = std::result::Result<T, CrapiError>;

/// Errors raised while compiling mappings or translating resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CrapiError {
    /// Malformed mapping extension or a value that cannot be coerced
    #[error("invalid mapping schema: {0}")]
    Schema(String),

    /// Invalid CRD document or translator configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Object map navigation or conversion failure
    #[error(transparent)]
    ObjMap(#[from] ObjMapError),

    /// A reference names an object that was not supplied
    #[error("failed to find Kubernetes resource {kind} '{name}'")]
    DependencyNotFound { kind: String, name: String },

    /// The referenced object does not hold the requested key
    #[error("key '{key}' not found in Kubernetes resource '{name}'")]
    MissingKey { name: String, key: String },

    /// No supplied object holds the raw value and none can be created
    #[error("no {kind} matches the value and the mapping has no property selectors to create one")]
    NoMatchingPropertySelector { kind: String },

    /// The reference record lacks the field holding the object name
    #[error("reference has no '{selector}' field")]
    MissingReferenceName { selector: String },

    /// A holder object exists but the mapped field is absent
    #[error("field '{path}' is missing")]
    MissingField { path: String },

    /// No registered type for a kind
    #[error("no resource type registered for kind '{kind}'")]
    NotRegistered { kind: String },

    /// The CRD does not serve the requested version
    #[error("CRD {kind} has no version '{version}'")]
    UnknownCrdVersion { kind: String, version: String },

    /// The CRD version schema lacks `spec.<sdk version>`
    #[error("CRD {kind} does not declare SDK version '{version}' under spec")]
    MissingSdkVersion { kind: String, version: String },

    /// The object is not the kind the translator was built for
    #[error("resource must be a {expected} but got {found}")]
    KindMismatch { expected: String, found: String },

    /// Failure while processing one mapping
    #[error("translation of resource failed at field `{path}`: {source}")]
    Field {
        path: String,
        #[source]
        source: Box<CrapiError>,
    },
}

impl From<serde_json::Error> for CrapiError {
    fn from(e: serde_json::Error) -> Self {
        CrapiError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for CrapiError {
    fn from(e: serde_yaml::Error) -> Self {
        CrapiError::Serialization(e.to_string())
    }
}

impl CrapiError {
    /// Check if this is the object map not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, CrapiError::ObjMap(e) if e.is_not_found())
    }

    /// Wrap this error with the mapping path it was raised for
    pub fn at_field(self, path: impl Into<String>) -> Self {
        CrapiError::Field {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, unwrapping field context
    pub fn root_cause(&self) -> &CrapiError {
        match self {
            CrapiError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
