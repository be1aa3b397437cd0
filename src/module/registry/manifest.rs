//! Module manifest parsing
//!
//! Handles parsing `module.toml` descriptors used by module discovery.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::traits::{ModuleError, ModuleIdentity};

/// Module manifest (module.toml structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Module short name
    pub name: String,
    /// Module version (semantic versioning)
    pub version: String,
    /// Codebase identifier; defaults to the module directory
    #[serde(default)]
    pub codebase: Option<String>,
    /// Metadata blob file, relative to the module directory
    #[serde(default)]
    pub metadata: Option<String>,
    /// Statically declared references
    #[serde(default)]
    pub references: Vec<ModuleIdentity>,
}

impl ModuleManifest {
    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ModuleError::InvalidManifest(format!("Failed to read manifest file: {}", e))
        })?;

        let manifest: ModuleManifest = toml::from_str(&contents).map_err(|e| {
            ModuleError::InvalidManifest(format!("Failed to parse manifest TOML: {}", e))
        })?;

        if manifest.name.is_empty() {
            return Err(ModuleError::InvalidManifest(
                "Module name cannot be empty".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Identity of the described module, rooted at its directory
    pub fn identity(&self, module_dir: &Path) -> ModuleIdentity {
        let codebase = self
            .codebase
            .clone()
            .unwrap_or_else(|| module_dir.to_string_lossy().to_string());
        ModuleIdentity::new(self.name.clone(), codebase).with_version(self.version.clone())
    }
}
