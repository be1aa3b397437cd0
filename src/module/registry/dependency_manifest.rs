//! Compile-time dependency manifest
//!
//! Describes the libraries a root module was compiled against. Some
//! deployment modes (single-file bundles) ship a manifest whose compile
//! library list is empty even though every module is loaded and usable, so
//! callers must treat an empty manifest as unusable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::traits::ModuleError;

/// One compile-time library entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileLibrary {
    /// Library name
    pub name: String,
    /// Library version
    pub version: String,
    /// Reference assembly paths contributed by this library
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Dependency manifest of a root module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    /// Root module name
    pub name: String,
    /// Root module version
    pub version: String,
    /// Libraries visible at compile time
    #[serde(default)]
    pub compile_libraries: Vec<CompileLibrary>,
}

impl DependencyManifest {
    /// Create a manifest with no compile libraries
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            compile_libraries: Vec::new(),
        }
    }

    /// Add a compile library
    pub fn with_library(mut self, library: CompileLibrary) -> Self {
        self.compile_libraries.push(library);
        self
    }

    /// Whether the manifest carries compile dependency information
    pub fn is_usable(&self) -> bool {
        !self.compile_libraries.is_empty()
    }

    /// Load a manifest from a `.json` or `.toml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ModuleError::InvalidManifest(format!("Failed to read dependency manifest: {}", e))
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let manifest: DependencyManifest = if is_json {
            serde_json::from_str(&contents).map_err(|e| {
                ModuleError::InvalidManifest(format!(
                    "Failed to parse dependency manifest JSON: {}",
                    e
                ))
            })?
        } else {
            toml::from_str(&contents).map_err(|e| {
                ModuleError::InvalidManifest(format!(
                    "Failed to parse dependency manifest TOML: {}",
                    e
                ))
            })?
        };

        if manifest.name.is_empty() {
            return Err(ModuleError::InvalidManifest(
                "Dependency manifest name cannot be empty".to_string(),
            ));
        }

        Ok(manifest)
    }
}
