//! In-memory module registry
//!
//! A thread-safe registry holding the set of loaded modules and a catalog of
//! modules that can be loaded on demand. Loading a catalog entry moves it into
//! the loaded set, so later snapshots observe it.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::module::registry::dependency_manifest::DependencyManifest;
use crate::module::traits::{LoadedModule, ModuleError, ModuleIdentity, ModuleRc, ModuleRegistry};

/// Module value with fixed references and metadata
#[derive(Debug, Clone)]
pub struct StaticModule {
    identity: ModuleIdentity,
    references: Vec<ModuleIdentity>,
    metadata: Option<Bytes>,
}

impl StaticModule {
    /// Create a module with no references and no metadata view
    pub fn new(identity: ModuleIdentity) -> Self {
        Self {
            identity,
            references: Vec::new(),
            metadata: None,
        }
    }

    /// Add a static reference
    pub fn with_reference(mut self, reference: ModuleIdentity) -> Self {
        self.references.push(reference);
        self
    }

    /// Add several static references, keeping their order
    pub fn with_references<I>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = ModuleIdentity>,
    {
        self.references.extend(references);
        self
    }

    /// Attach a raw metadata blob
    pub fn with_metadata(mut self, metadata: impl Into<Bytes>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Wrap into a shared module handle
    pub fn into_rc(self) -> ModuleRc {
        Arc::new(self)
    }
}

impl LoadedModule for StaticModule {
    fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    fn static_references(&self) -> Vec<ModuleIdentity> {
        self.references.clone()
    }

    fn raw_metadata(&self) -> Result<Option<Bytes>, ModuleError> {
        Ok(self.metadata.clone())
    }
}

/// Loaded modules in load order, indexed by codebase and name
#[derive(Default)]
struct LoadedSet {
    order: Vec<ModuleRc>,
    by_codebase: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl LoadedSet {
    fn push(&mut self, module: ModuleRc) {
        let index = self.order.len();
        let identity = module.identity();
        self.by_codebase.entry(identity.codebase.clone()).or_insert(index);
        self.by_name.entry(identity.name.clone()).or_insert(index);
        self.order.push(module);
    }

    fn find(&self, identity: &ModuleIdentity) -> Option<&ModuleRc> {
        self.by_codebase
            .get(&identity.codebase)
            .or_else(|| self.by_name.get(&identity.name))
            .map(|&index| &self.order[index])
    }
}

/// Registry backed by in-process maps
#[derive(Default)]
pub struct InMemoryRegistry {
    loaded: RwLock<LoadedSet>,
    /// Loadable modules keyed by short name
    catalog: RwLock<HashMap<String, ModuleRc>>,
    /// Dependency manifests keyed by root codebase
    manifests: RwLock<HashMap<String, DependencyManifest>>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the loaded set
    pub fn insert_loaded(&self, module: ModuleRc) -> Result<(), ModuleError> {
        let mut loaded = self.loaded.write().map_err(|_| ModuleError::LockPoisoned)?;
        loaded.push(module);
        Ok(())
    }

    /// Make a module loadable by name without loading it
    pub fn insert_loadable(&self, module: ModuleRc) -> Result<(), ModuleError> {
        let mut catalog = self.catalog.write().map_err(|_| ModuleError::LockPoisoned)?;
        catalog.insert(module.identity().name.clone(), module);
        Ok(())
    }

    /// Register the dependency manifest of a root module
    pub fn insert_manifest(
        &self,
        root: &ModuleIdentity,
        manifest: DependencyManifest,
    ) -> Result<(), ModuleError> {
        let mut manifests = self.manifests.write().map_err(|_| ModuleError::LockPoisoned)?;
        manifests.insert(root.codebase.clone(), manifest);
        Ok(())
    }

    /// Whether a module with this codebase is loaded
    pub fn is_loaded(&self, codebase: &str) -> bool {
        match self.loaded.read() {
            Ok(loaded) => loaded.by_codebase.contains_key(codebase),
            Err(poisoned) => poisoned.into_inner().by_codebase.contains_key(codebase),
        }
    }

    /// Number of loaded modules
    pub fn loaded_count(&self) -> usize {
        match self.loaded.read() {
            Ok(loaded) => loaded.order.len(),
            Err(poisoned) => poisoned.into_inner().order.len(),
        }
    }

    fn find_loaded(&self, identity: &ModuleIdentity) -> Result<Option<ModuleRc>, ModuleError> {
        let loaded = self.loaded.read().map_err(|_| ModuleError::LockPoisoned)?;
        Ok(loaded.find(identity).cloned())
    }
}

impl ModuleRegistry for InMemoryRegistry {
    fn load_module(&self, identity: &ModuleIdentity) -> Result<ModuleRc, ModuleError> {
        if let Some(module) = self.find_loaded(identity)? {
            return Ok(module);
        }

        // Lock order: loaded, then catalog. Holding the loaded write lock
        // across the re-check and the move keeps racing loads from observing
        // a module that is in neither map.
        let mut loaded = self.loaded.write().map_err(|_| ModuleError::LockPoisoned)?;
        if let Some(module) = loaded.find(identity) {
            return Ok(Arc::clone(module));
        }

        let module = {
            let mut catalog = self.catalog.write().map_err(|_| ModuleError::LockPoisoned)?;
            catalog
                .remove(&identity.name)
                .ok_or_else(|| ModuleError::ModuleNotFound(identity.to_string()))?
        };

        debug!("Loaded module {}", module.identity());
        loaded.push(Arc::clone(&module));
        Ok(module)
    }

    fn loaded_modules(&self) -> Vec<ModuleRc> {
        match self.loaded.read() {
            Ok(loaded) => loaded.order.clone(),
            Err(poisoned) => poisoned.into_inner().order.clone(),
        }
    }

    fn dependency_manifest(&self, root: &ModuleIdentity) -> Option<DependencyManifest> {
        match self.manifests.read() {
            Ok(manifests) => manifests.get(&root.codebase).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&root.codebase).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str) -> StaticModule {
        StaticModule::new(ModuleIdentity::new(name, format!("mem://{}", name)))
    }

    #[test]
    fn test_load_moves_catalog_entry_into_loaded_set() {
        let registry = InMemoryRegistry::new();
        registry.insert_loadable(module("Lib").into_rc()).unwrap();
        assert_eq!(registry.loaded_count(), 0);

        let loaded = registry
            .load_module(&ModuleIdentity::new("Lib", "mem://Lib"))
            .unwrap();
        assert_eq!(loaded.identity().name, "Lib");
        assert!(registry.is_loaded("mem://Lib"));

        // Second load returns the resident instance
        let again = registry
            .load_module(&ModuleIdentity::new("Lib", "mem://Lib"))
            .unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
        assert_eq!(registry.loaded_count(), 1);
    }

    #[test]
    fn test_concurrent_loads_all_succeed() {
        use std::sync::Barrier;
        use std::thread;

        const THREADS: usize = 8;

        for _ in 0..200 {
            let registry = Arc::new(InMemoryRegistry::new());
            registry.insert_loadable(module("Lib").into_rc()).unwrap();
            let barrier = Arc::new(Barrier::new(THREADS));

            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        registry.load_module(&ModuleIdentity::new("Lib", "mem://Lib"))
                    })
                })
                .collect();

            let loaded: Vec<ModuleRc> = handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect();
            assert!(loaded.iter().all(|m| Arc::ptr_eq(m, &loaded[0])));
            assert_eq!(registry.loaded_count(), 1);
        }
    }

    #[test]
    fn test_load_unknown_module() {
        let registry = InMemoryRegistry::new();
        let result = registry.load_module(&ModuleIdentity::new("Missing", "mem://Missing"));
        assert!(matches!(result, Err(ModuleError::ModuleNotFound(_))));
    }

    #[test]
    fn test_manifest_lookup_by_codebase() {
        let registry = InMemoryRegistry::new();
        let root = ModuleIdentity::new("App", "mem://App");
        assert!(registry.dependency_manifest(&root).is_none());

        registry
            .insert_manifest(&root, DependencyManifest::new("App", "1.0.0"))
            .unwrap();
        assert_eq!(registry.dependency_manifest(&root).unwrap().name, "App");
    }
}
