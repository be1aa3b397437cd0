//! Module discovery
//!
//! Scans module directories and builds modules from their `module.toml`
//! descriptors and metadata blobs.

use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::module::registry::manifest::ModuleManifest;
use crate::module::registry::memory::{InMemoryRegistry, StaticModule};
use crate::module::traits::ModuleError;
use crate::module::validation::{ManifestValidator, ValidationResult};

/// Discovered module information
#[derive(Debug, Clone)]
pub struct DiscoveredModule {
    /// Module directory path
    pub directory: PathBuf,
    /// Module manifest
    pub manifest: ModuleManifest,
    /// Module built from the manifest
    pub module: StaticModule,
}

/// Module discovery scanner
pub struct ModuleDiscovery {
    /// Base directory to scan for modules
    modules_dir: PathBuf,
}

impl ModuleDiscovery {
    /// Create a new module discovery scanner
    pub fn new<P: AsRef<Path>>(modules_dir: P) -> Self {
        Self {
            modules_dir: modules_dir.as_ref().to_path_buf(),
        }
    }

    /// Discover all modules in the modules directory
    ///
    /// Subdirectories without a `module.toml`, and manifests that fail to
    /// parse or validate, are skipped.
    pub fn discover_modules(&self) -> Result<Vec<DiscoveredModule>, ModuleError> {
        info!("Discovering modules in {:?}", self.modules_dir);

        if !self.modules_dir.exists() {
            debug!("Modules directory does not exist: {:?}", self.modules_dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.modules_dir).map_err(|e| {
            ModuleError::OperationError(format!("Failed to read modules directory: {}", e))
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ModuleError::OperationError(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        let mut modules = Vec::new();
        for path in dirs {
            let manifest_path = path.join("module.toml");
            if !manifest_path.exists() {
                debug!("No module.toml found in {:?}, skipping", path);
                continue;
            }

            match self.load_module_dir(&path) {
                Ok(discovered) => modules.push(discovered),
                Err(e) => {
                    warn!("Skipping module in {:?}: {}", path, e);
                    continue;
                }
            }
        }

        info!("Discovered {} modules", modules.len());
        Ok(modules)
    }

    /// Discover a specific module by directory name
    pub fn discover_module(&self, module_name: &str) -> Result<DiscoveredModule, ModuleError> {
        let module_dir = self.modules_dir.join(module_name);
        if !module_dir.join("module.toml").exists() {
            return Err(ModuleError::ModuleNotFound(format!(
                "Module {} not found (no module.toml in {:?})",
                module_name, module_dir
            )));
        }

        self.load_module_dir(&module_dir)
    }

    /// Discover modules and add them to a registry
    ///
    /// With `preload` the modules join the loaded set, otherwise they only
    /// become loadable by name.
    pub fn register_all(
        &self,
        registry: &InMemoryRegistry,
        preload: bool,
    ) -> Result<usize, ModuleError> {
        let discovered = self.discover_modules()?;
        let count = discovered.len();
        for d in discovered {
            let module = d.module.into_rc();
            if preload {
                registry.insert_loaded(module)?;
            } else {
                registry.insert_loadable(module)?;
            }
        }
        Ok(count)
    }

    fn load_module_dir(&self, module_dir: &Path) -> Result<DiscoveredModule, ModuleError> {
        let manifest = ModuleManifest::from_file(module_dir.join("module.toml"))?;

        let validator = ManifestValidator::new();
        if let ValidationResult::Invalid(errors) = validator.validate(&manifest) {
            return Err(ModuleError::InvalidManifest(errors.join("; ")));
        }

        let mut module = StaticModule::new(manifest.identity(module_dir))
            .with_references(manifest.references.iter().cloned());

        if let Some(metadata) = &manifest.metadata {
            let metadata_path = module_dir.join(metadata);
            match fs::read(&metadata_path) {
                Ok(blob) => module = module.with_metadata(Bytes::from(blob)),
                Err(e) => warn!(
                    "Metadata for module {} unreadable at {:?}: {}",
                    manifest.name, metadata_path, e
                ),
            }
        }

        Ok(DiscoveredModule {
            directory: module_dir.to_path_buf(),
            manifest,
            module,
        })
    }
}
