//! Manifest validation
//!
//! Validates module manifests for naming, versioning and reference structure.

use std::path::{Component, Path};
use tracing::{debug, warn};

use crate::module::registry::manifest::ModuleManifest;
use crate::module::traits::ModuleIdentity;

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Manifest is valid
    Valid,
    /// Manifest is invalid with specific errors
    Invalid(Vec<String>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Manifest validator
pub struct ManifestValidator {
    /// Maximum module name length
    max_name_len: usize,
}

impl ManifestValidator {
    /// Create a new manifest validator
    pub fn new() -> Self {
        Self { max_name_len: 256 }
    }

    /// Validate a module manifest
    pub fn validate(&self, manifest: &ModuleManifest) -> ValidationResult {
        let mut errors = Vec::new();

        if !self.is_valid_name(&manifest.name) {
            errors.push(format!(
                "Invalid module name: {} (must be alphanumeric with dots/dashes/underscores)",
                manifest.name
            ));
        }

        if manifest.version.is_empty() {
            errors.push("Module version cannot be empty".to_string());
        } else if !self.is_valid_version(&manifest.version) {
            errors.push(format!(
                "Invalid version format: {} (expected semantic versioning)",
                manifest.version
            ));
        }

        if let Some(codebase) = &manifest.codebase {
            if codebase.trim().is_empty() {
                errors.push("Codebase cannot be blank when specified".to_string());
            }
        }

        if let Some(metadata) = &manifest.metadata {
            if !self.is_contained_path(metadata) {
                errors.push(format!(
                    "Metadata path must stay inside the module directory: {}",
                    metadata
                ));
            }
        }

        if let Err(ref_errors) = self.validate_references(&manifest.references) {
            errors.extend(ref_errors);
        }

        if errors.is_empty() {
            debug!("Manifest validation passed for module: {}", manifest.name);
            ValidationResult::Valid
        } else {
            warn!(
                "Manifest validation failed for module {}: {:?}",
                manifest.name, errors
            );
            ValidationResult::Invalid(errors)
        }
    }

    /// Validate module name format
    #[inline]
    fn is_valid_name(&self, name: &str) -> bool {
        if name.is_empty() || name.len() > self.max_name_len {
            return false;
        }

        if !name.chars().next().map_or(false, |c| c.is_alphanumeric()) {
            return false;
        }

        name.chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    }

    /// Validate version format
    ///
    /// Accepts: major.minor[.patch[.revision]][-prerelease][+build]
    #[inline]
    fn is_valid_version(&self, version: &str) -> bool {
        let base = version.split('+').next().unwrap_or(version);
        let version_part = base.split('-').next().unwrap_or(base);

        let nums: Vec<&str> = version_part.split('.').collect();
        if nums.len() < 2 || nums.len() > 4 {
            return false;
        }

        nums.iter().all(|n| {
            !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) && n.parse::<u32>().is_ok()
        })
    }

    /// Relative path without parent traversal
    fn is_contained_path(&self, path: &str) -> bool {
        let path = Path::new(path);
        !path.as_os_str().is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }

    fn validate_references(&self, references: &[ModuleIdentity]) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for reference in references {
            if !self.is_valid_name(&reference.name) {
                errors.push(format!("Invalid reference name: {}", reference.name));
            }
            if reference.codebase.trim().is_empty() {
                errors.push(format!("Reference {} has no codebase", reference.name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str, version: &str) -> ModuleManifest {
        ModuleManifest {
            name: name.to_string(),
            version: version.to_string(),
            codebase: None,
            metadata: None,
            references: Vec::new(),
        }
    }

    #[test]
    fn test_valid_dotted_name() {
        let validator = ManifestValidator::new();
        assert!(validator.validate(&manifest("Acme.Core", "1.0.0")).is_valid());
        assert!(validator.validate(&manifest("Acme.Core", "4.2.0.0")).is_valid());
        assert!(validator.validate(&manifest("Acme.Core", "1.0-beta+7")).is_valid());
    }

    #[test]
    fn test_invalid_name_and_version() {
        let validator = ManifestValidator::new();
        match validator.validate(&manifest(".hidden", "one")) {
            ValidationResult::Invalid(errors) => assert_eq!(errors.len(), 2),
            ValidationResult::Valid => panic!("expected invalid manifest"),
        }
    }

    #[test]
    fn test_metadata_path_must_not_escape() {
        let validator = ManifestValidator::new();
        let mut m = manifest("Acme.Core", "1.0.0");
        m.metadata = Some("../secrets.bin".to_string());
        assert!(!validator.validate(&m).is_valid());

        m.metadata = Some("meta/Acme.Core.bin".to_string());
        assert!(validator.validate(&m).is_valid());
    }

    #[test]
    fn test_reference_needs_codebase() {
        let validator = ManifestValidator::new();
        let mut m = manifest("Acme.Web", "1.0.0");
        m.references.push(ModuleIdentity::new("Acme.Core", " "));
        assert!(!validator.validate(&m).is_valid());
    }
}
