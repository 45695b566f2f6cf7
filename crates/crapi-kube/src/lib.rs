//! crapi Kube - the Kubernetes side of the crapi translation engine
//!
//! This crate provides:
//! - **CRD parsing**: CRD YAML into schema trees that keep `x-*` extensions
//! - **Reference mappings**: discovery of `x-kubernetes-mapping` /
//!   `x-openapi-mapping` pairs, and the expand/collapse steps that move
//!   values between API objects and Kubernetes dependencies
//! - **Type registry**: known resource types for dependency kind detection
//! - **Translator**: custom resource <-> API object conversion for one SDK
//!   version
//! - **Configuration**: YAML translator settings

pub mod config;
pub mod crd;
pub mod error;
pub mod refs;
pub mod scheme;
pub mod translator;

pub use config::TranslatorConfig;
pub use crd::{CrdParser, CrdSchema, find_by_kind};
pub use error::{CrapiError, Result};
pub use refs::{KubeMapping, KubeType, Kubeset, Mapping, OpenApiMapping, collapse_all, expand_all, find_mappings};
pub use scheme::Scheme;
pub use translator::{API_MAPPINGS_ANNOTATION, DEFAULT_OPTIONAL_EXPANSIONS, Translator};
