#![allow(dead_code)]

use bytes::Bytes;
use reference_resolver::module::{
    DependencyManifest, InMemoryRegistry, LoadedModule, ModuleError, ModuleIdentity, ModuleRc,
    ModuleRegistry, StaticModule,
};
use reference_resolver::resolver::{MetadataReference, MetadataRoot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn id(name: &str) -> ModuleIdentity {
    ModuleIdentity::new(name, format!("mem://{}", name))
}

pub fn metadata_blob() -> Bytes {
    Bytes::from(MetadataRoot::new("v4.0.30319").encode())
}

pub fn extra_reference(name: &str) -> MetadataReference {
    MetadataReference::from_bytes(name, metadata_blob()).unwrap()
}

fn module(name: &str, refs: &[&str], metadata: bool) -> StaticModule {
    let mut m = StaticModule::new(id(name)).with_references(refs.iter().map(|r| id(r)));
    if metadata {
        m = m.with_metadata(metadata_blob());
    }
    m
}

/// Builds module graphs on top of an in-memory registry
pub struct GraphBuilder {
    registry: Arc<InMemoryRegistry>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(InMemoryRegistry::new()),
        }
    }

    /// Loaded module with metadata
    pub fn loaded(&self, name: &str, refs: &[&str]) -> ModuleRc {
        let m = module(name, refs, true).into_rc();
        self.registry.insert_loaded(m.clone()).unwrap();
        m
    }

    /// Loaded module exposing no metadata view
    pub fn loaded_opaque(&self, name: &str, refs: &[&str]) -> ModuleRc {
        let m = module(name, refs, false).into_rc();
        self.registry.insert_loaded(m.clone()).unwrap();
        m
    }

    /// Module that becomes loaded only when something loads it
    pub fn loadable(&self, name: &str, refs: &[&str]) {
        self.registry
            .insert_loadable(module(name, refs, true).into_rc())
            .unwrap();
    }

    pub fn manifest(&self, root: &ModuleRc, manifest: DependencyManifest) {
        self.registry.insert_manifest(root.identity(), manifest).unwrap();
    }

    pub fn registry(&self) -> Arc<InMemoryRegistry> {
        self.registry.clone()
    }
}

/// Registry wrapper recording every load request
pub struct CountingRegistry {
    inner: Arc<InMemoryRegistry>,
    loads: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl CountingRegistry {
    pub fn new(inner: Arc<InMemoryRegistry>) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ModuleRegistry for CountingRegistry {
    fn load_module(&self, identity: &ModuleIdentity) -> Result<ModuleRc, ModuleError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(identity.name.clone());
        self.inner.load_module(identity)
    }

    fn loaded_modules(&self) -> Vec<ModuleRc> {
        self.inner.loaded_modules()
    }

    fn dependency_manifest(&self, root: &ModuleIdentity) -> Option<DependencyManifest> {
        self.inner.dependency_manifest(root)
    }
}

/// Module whose metadata view always fails
pub struct UnreadableModule(pub ModuleIdentity);

impl LoadedModule for UnreadableModule {
    fn identity(&self) -> &ModuleIdentity {
        &self.0
    }

    fn static_references(&self) -> Vec<ModuleIdentity> {
        Vec::new()
    }

    fn raw_metadata(&self) -> Result<Option<Bytes>, ModuleError> {
        Err(ModuleError::MetadataUnavailable(format!(
            "{} has no mapped image",
            self.0.name
        )))
    }
}

/// Multiset view of a reference list
pub fn multiset(refs: &[MetadataReference]) -> HashMap<MetadataReference, usize> {
    let mut counts = HashMap::new();
    for r in refs {
        *counts.entry(r.clone()).or_insert(0) += 1;
    }
    counts
}
