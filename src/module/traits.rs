//! Module system traits and interfaces
//!
//! Defines the capabilities the resolver needs from the host: a loaded
//! module that can report its identity, its static references and a view of
//! its metadata, and a registry that can load and enumerate such modules.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::module::registry::dependency_manifest::DependencyManifest;

/// Identity of a module as seen by the loader
///
/// `name` is the short name used for exclusion matching. `codebase` is the
/// location identifier used to recognize a module that was already visited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleIdentity {
    /// Short module name (e.g. `Acme.Templates`)
    pub name: String,
    /// Location/codebase identifier (path, URI or any loader-unique key)
    pub codebase: String,
    /// Module version, if the loader reports one
    #[serde(default)]
    pub version: Option<String>,
}

impl ModuleIdentity {
    /// Create an identity without version information
    pub fn new(name: impl Into<String>, codebase: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codebase: codebase.into(),
            version: None,
        }
    }

    /// Attach a version to this identity
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {} ({})", self.name, version, self.codebase),
            None => write!(f, "{} ({})", self.name, self.codebase),
        }
    }
}

/// A module already loaded by the host
///
/// The resolver only observes modules; their lifetime belongs to the
/// registry that handed them out.
pub trait LoadedModule: Send + Sync {
    /// Module identity
    fn identity(&self) -> &ModuleIdentity;

    /// Modules this module statically references
    fn static_references(&self) -> Vec<ModuleIdentity>;

    /// Immutable view of the module's mapped metadata
    ///
    /// `Ok(None)` means the module exposes no metadata view at all (the
    /// module is then invisible to the compiler). `Err` means the view
    /// exists but could not be obtained.
    fn raw_metadata(&self) -> Result<Option<Bytes>, ModuleError>;
}

/// Shared handle to a loaded module
pub type ModuleRc = Arc<dyn LoadedModule>;

/// Process-wide module registry capability
///
/// Injected into the resolver instead of being reached through global state.
pub trait ModuleRegistry: Send + Sync {
    /// Load (or return the already-loaded instance of) a module
    fn load_module(&self, identity: &ModuleIdentity) -> Result<ModuleRc, ModuleError>;

    /// Snapshot of every module currently loaded
    fn loaded_modules(&self) -> Vec<ModuleRc>;

    /// Compile-time dependency manifest for a root module, when the host has one
    fn dependency_manifest(&self, _root: &ModuleIdentity) -> Option<DependencyManifest> {
        None
    }
}

/// Module system errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module load failed: {0}")]
    LoadFailed(String),

    #[error("Module metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("Module operation failed: {0}")]
    OperationError(String),

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

impl From<anyhow::Error> for ModuleError {
    fn from(e: anyhow::Error) -> Self {
        ModuleError::LoadFailed(e.to_string())
    }
}

impl From<std::io::Error> for ModuleError {
    fn from(e: std::io::Error) -> Self {
        ModuleError::OperationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let id = ModuleIdentity::new("Acme.Core", "/opt/acme/Acme.Core.dll");
        assert_eq!(id.to_string(), "Acme.Core (/opt/acme/Acme.Core.dll)");

        let id = id.with_version("1.2.0");
        assert_eq!(id.to_string(), "Acme.Core 1.2.0 (/opt/acme/Acme.Core.dll)");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: ModuleError = anyhow::anyhow!("loader exploded").into();
        assert!(matches!(err, ModuleError::LoadFailed(ref msg) if msg == "loader exploded"));
    }
}
