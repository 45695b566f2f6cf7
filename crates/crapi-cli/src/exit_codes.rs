//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions where applicable. Usage errors
//! are reported by clap itself.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - unreadable or malformed resource, response or dependency file
pub const INPUT_ERROR: i32 = 2;

/// Translation error - a reference could not be resolved or expanded
pub const TRANSLATION_ERROR: i32 = 3;

/// CRD error - missing CRD, version or malformed mapping extension
pub const CRD_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
