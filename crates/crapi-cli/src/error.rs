//! CLI error types with exit code handling
//!
//! Every command returns [`CliError`], which carries the exit code the
//! process ends with.

use crapi_kube::CrapiError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Input file could not be understood
    #[error("Invalid input: {message}")]
    #[diagnostic(code(crapi::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// CRD missing, or unusable for the requested versions
    #[error("CRD error: {message}")]
    #[diagnostic(code(crapi::cli::crd))]
    Crd {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Expand or collapse failed
    #[error("Translation failed: {message}")]
    #[diagnostic(code(crapi::cli::translation))]
    Translation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crapi::cli::io))]
    Io { message: String },

    /// Internal error (unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(crapi::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Crd { .. } => exit_codes::CRD_ERROR,
            CliError::Translation { .. } => exit_codes::TRANSLATION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn crd(message: impl Into<String>) -> Self {
        Self::Crd {
            message: message.into(),
            help: None,
        }
    }

    pub fn crd_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Crd {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CrapiError> for CliError {
    fn from(err: CrapiError) -> Self {
        let message = err.to_string();
        match err.root_cause() {
            CrapiError::Io(_) => CliError::Io { message },
            CrapiError::Schema(_)
            | CrapiError::InvalidConfig(_)
            | CrapiError::UnknownCrdVersion { .. }
            | CrapiError::MissingSdkVersion { .. } => CliError::Crd {
                message,
                help: Some("check the CRD file and the --crd-version and --sdk-version flags".to_string()),
            },
            CrapiError::KindMismatch { .. } | CrapiError::Serialization(_) => CliError::Input {
                message,
                help: None,
            },
            CrapiError::DependencyNotFound { .. }
            | CrapiError::MissingKey { .. }
            | CrapiError::NoMatchingPropertySelector { .. } => {
                CliError::Translation {
                    message,
                    help: Some("pass the referenced objects with --deps".to_string()),
                }
            }
            _ => CliError::Translation {
                message,
                help: None,
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::input("x").exit_code(), exit_codes::INPUT_ERROR);
        assert_eq!(CliError::crd("x").exit_code(), exit_codes::CRD_ERROR);
        assert_eq!(CliError::internal("x").exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_from_crapi_error_uses_root_cause() {
        let err = CrapiError::DependencyNotFound {
            kind: "Secret".to_string(),
            name: "creds".to_string(),
        }
        .at_field("spec.v20250312.apiKeyRef");

        let cli: CliError = err.into();
        assert_eq!(cli.exit_code(), exit_codes::TRANSLATION_ERROR);
        assert!(cli.to_string().contains("spec.v20250312.apiKeyRef"));
        assert!(cli.to_string().contains("failed to find Kubernetes resource Secret 'creds'"));

        let cli: CliError = CrapiError::UnknownCrdVersion {
            kind: "Group".to_string(),
            version: "v9".to_string(),
        }
        .into();
        assert_eq!(cli.exit_code(), exit_codes::CRD_ERROR);
    }
}
