//! CLI commands

pub mod from_api;
pub mod mappings;
pub mod to_api;
