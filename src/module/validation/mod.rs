//! Module validation framework
//!
//! Validates `module.toml` descriptors before discovery turns them into modules.

pub mod manifest_validator;

pub use manifest_validator::{ManifestValidator, ValidationResult};
