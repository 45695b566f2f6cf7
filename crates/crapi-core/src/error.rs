//! Object mapper error types

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObjMapError {
    /// Sentinel for an absent path segment or final key.
    ///
    /// Callers use it as a "nothing to do here" signal and usually swallow it.
    #[error("field not found at {path}")]
    NotFound { path: String },

    #[error("type mismatch at {path}: expected {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to convert object map: {0}")]
    Convert(#[from] serde_json::Error),
}

impl ObjMapError {
    /// Check if this is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjMapError::NotFound { .. })
    }

    pub(crate) fn not_found<S: AsRef<str>>(path: &[S]) -> Self {
        ObjMapError::NotFound {
            path: crate::path::join(path),
        }
    }

    pub(crate) fn mismatch<S: AsRef<str>>(path: &[S], expected: &'static str, found: &Value) -> Self {
        ObjMapError::TypeMismatch {
            path: crate::path::join(path),
            expected,
            found: kind_of(found),
        }
    }
}

/// Short JSON type name used in error messages
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub type Result<T> = std::result::Result<T, ObjMapError>;
