//! CRD (CustomResourceDefinition) handling
//!
//! - **Schema representation** (`schema`): CRD names, versions and the
//!   OpenAPI tree with its `x-*` extensions
//! - **Parsing** (`parser`): single or multi-document CRD YAML into schemas
//!
//! # Example
//!
//! ```ignore
//! use crapi_kube::crd::{CrdParser, find_by_kind};
//!
//! let crds = CrdParser::parse_all(&std::fs::read_to_string("crds.yaml")?)?;
//! let group = find_by_kind(&crds, "Group").expect("Group CRD");
//! assert!(group.version("v1").unwrap().has_sdk_version("v20250312"));
//! ```

mod parser;
mod schema;

pub use parser::{CrdParser, find_by_kind};
pub use schema::{CrdNames, CrdSchema, CrdVersionSchema, OpenApiSchema, SchemaProperty};
