//! Metadata reference manager
//!
//! Computes the list of metadata handles a template compilation needs.
//!
//! ## Strategies
//!
//! - **Snapshot** (default): every module currently loaded in the process that
//!   exposes metadata. Single-file deployments ship dependency manifests whose
//!   compile library list is empty even though every module is loaded, so the
//!   loaded set is the only reliable source there.
//! - **Transitive**: the root plus its transitive static references, used only
//!   when the root has a usable dependency manifest. Without one the snapshot
//!   is taken instead.
//!
//! Additional references are appended after either strategy, duplicates
//! included; the compiler tolerates repeated handles.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{ResolutionStrategy, ResolverConfig};
use crate::module::registry::dependency_manifest::DependencyManifest;
use crate::module::traits::{LoadedModule, ModuleRc, ModuleRegistry};
use crate::resolver::error::ResolveError;
use crate::resolver::exclusion::ExclusionSet;
use crate::resolver::metadata::{extract_metadata_handle, MetadataReference};
use crate::resolver::walker::TransitiveWalker;

/// Produces the reference list for a compilation rooted at a module
pub trait MetadataReferenceManager: Send + Sync {
    /// References always handed to the compiler
    fn additional_references(&self) -> &HashSet<MetadataReference>;

    /// Patterns filtering modules out of transitive walks
    fn excluded_modules(&self) -> &ExclusionSet;

    /// Resolve the references needed to compile code calling into `root`
    fn resolve(&self, root: &ModuleRc) -> Result<Vec<MetadataReference>, ResolveError>;
}

/// Construction options with explicitly optional collections
///
/// A `None` collection is rejected with `NullConfiguration`.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub additional_references: Option<HashSet<MetadataReference>>,
    pub excluded_modules: Option<ExclusionSet>,
    pub strategy: ResolutionStrategy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            additional_references: Some(HashSet::new()),
            excluded_modules: Some(ExclusionSet::new()),
            strategy: ResolutionStrategy::default(),
        }
    }
}

impl ResolverOptions {
    /// Build options from configuration, reading additional reference files
    ///
    /// The configuration is validated first; a blank exclusion pattern would
    /// otherwise match every module.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolveError> {
        config
            .validate()
            .map_err(|e| ResolveError::InvalidConfiguration(e.to_string()))?;

        let additional_references = config
            .additional_references
            .iter()
            .map(MetadataReference::from_file)
            .collect::<Result<HashSet<_>, _>>()?;

        let excluded_modules = ExclusionSet::from_patterns(config.excluded_modules.iter().cloned())
            .with_mode(config.exclusion_match);

        Ok(Self {
            additional_references: Some(additional_references),
            excluded_modules: Some(excluded_modules),
            strategy: config.strategy,
        })
    }
}

/// Default reference manager over an injected module registry
pub struct ReferenceResolver {
    registry: Arc<dyn ModuleRegistry>,
    additional_references: HashSet<MetadataReference>,
    excluded_modules: ExclusionSet,
    strategy: ResolutionStrategy,
}

impl ReferenceResolver {
    /// Resolver with no additional references and no exclusions
    pub fn new(registry: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            registry,
            additional_references: HashSet::new(),
            excluded_modules: ExclusionSet::new(),
            strategy: ResolutionStrategy::default(),
        }
    }

    /// Resolver with additional references and no exclusions
    pub fn with_additional_references(
        registry: Arc<dyn ModuleRegistry>,
        additional_references: Option<HashSet<MetadataReference>>,
    ) -> Result<Self, ResolveError> {
        Self::with_configuration(registry, additional_references, Some(ExclusionSet::new()))
    }

    /// Resolver with additional references and exclusions
    pub fn with_configuration(
        registry: Arc<dyn ModuleRegistry>,
        additional_references: Option<HashSet<MetadataReference>>,
        excluded_modules: Option<ExclusionSet>,
    ) -> Result<Self, ResolveError> {
        Self::from_options(
            registry,
            ResolverOptions {
                additional_references,
                excluded_modules,
                strategy: ResolutionStrategy::default(),
            },
        )
    }

    /// Resolver from construction options
    pub fn from_options(
        registry: Arc<dyn ModuleRegistry>,
        options: ResolverOptions,
    ) -> Result<Self, ResolveError> {
        let additional_references = options
            .additional_references
            .ok_or(ResolveError::NullConfiguration("additional_references"))?;
        let excluded_modules = options
            .excluded_modules
            .ok_or(ResolveError::NullConfiguration("excluded_modules"))?;

        Ok(Self {
            registry,
            additional_references,
            excluded_modules,
            strategy: options.strategy,
        })
    }

    /// Resolver from configuration
    pub fn from_config(
        registry: Arc<dyn ModuleRegistry>,
        config: &ResolverConfig,
    ) -> Result<Self, ResolveError> {
        Self::from_options(registry, ResolverOptions::from_config(config)?)
    }

    pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: ResolutionStrategy) {
        self.strategy = strategy;
    }

    pub fn additional_references_mut(&mut self) -> &mut HashSet<MetadataReference> {
        &mut self.additional_references
    }

    pub fn excluded_modules_mut(&mut self) -> &mut ExclusionSet {
        &mut self.excluded_modules
    }

    /// Resolve with an explicitly supplied dependency manifest
    ///
    /// `None`, or a manifest without compile libraries, selects the snapshot.
    pub fn resolve_with_manifest(
        &self,
        root: &ModuleRc,
        manifest: Option<&DependencyManifest>,
    ) -> Result<Vec<MetadataReference>, ResolveError> {
        let usable = manifest.filter(|m| m.is_usable());

        let mut references = match (self.strategy, usable) {
            (ResolutionStrategy::Transitive, Some(_)) => self.collect_transitive(root)?,
            _ => self.collect_snapshot()?,
        };
        let primary = references.len();

        references.extend(self.additional_references.iter().cloned());

        debug!(
            "Resolved {} references for {} ({} primary, {} additional)",
            references.len(),
            root.identity().name,
            primary,
            self.additional_references.len()
        );
        Ok(references)
    }

    fn load_manifest(&self, root: &ModuleRc) -> Result<DependencyManifest, ResolveError> {
        let identity = root.identity();
        self.registry
            .dependency_manifest(identity)
            .filter(DependencyManifest::is_usable)
            .ok_or_else(|| ResolveError::ManifestUnavailable(identity.name.clone()))
    }

    /// Handles of every loaded module exposing metadata
    fn collect_snapshot(&self) -> Result<Vec<MetadataReference>, ResolveError> {
        let mut references = Vec::new();
        for module in self.registry.loaded_modules() {
            if let Some(handle) = self.try_extract(module.as_ref())? {
                references.push(handle);
            }
        }
        Ok(references)
    }

    /// Handles of the root and every module reachable from it
    fn collect_transitive(&self, root: &ModuleRc) -> Result<Vec<MetadataReference>, ResolveError> {
        let mut references = Vec::new();
        if let Some(handle) = self.try_extract(root.as_ref())? {
            references.push(handle);
        }

        let walker = TransitiveWalker::new(self.registry.as_ref(), &self.excluded_modules, root);
        for module in walker {
            if let Some(handle) = self.try_extract(module?.as_ref())? {
                references.push(handle);
            }
        }
        Ok(references)
    }

    /// Extract one module's handle, absorbing per-module extraction failures
    fn try_extract(
        &self,
        module: &dyn LoadedModule,
    ) -> Result<Option<MetadataReference>, ResolveError> {
        match extract_metadata_handle(module) {
            Err(ResolveError::ExtractionFailed { module, source }) => {
                warn!("Omitting {} from references: {}", module, source);
                Ok(None)
            }
            other => other,
        }
    }
}

impl MetadataReferenceManager for ReferenceResolver {
    fn additional_references(&self) -> &HashSet<MetadataReference> {
        &self.additional_references
    }

    fn excluded_modules(&self) -> &ExclusionSet {
        &self.excluded_modules
    }

    fn resolve(&self, root: &ModuleRc) -> Result<Vec<MetadataReference>, ResolveError> {
        let manifest = match self.load_manifest(root) {
            Ok(manifest) => Some(manifest),
            Err(ResolveError::ManifestUnavailable(name)) => {
                debug!("No usable dependency manifest for {}, snapshotting loaded modules", name);
                None
            }
            Err(e) => return Err(e),
        };

        self.resolve_with_manifest(root, manifest.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::registry::dependency_manifest::CompileLibrary;
    use crate::module::registry::{InMemoryRegistry, StaticModule};
    use crate::module::traits::{ModuleError, ModuleIdentity};
    use crate::resolver::metadata::MetadataRoot;
    use bytes::Bytes;

    fn id(name: &str) -> ModuleIdentity {
        ModuleIdentity::new(name, format!("mem://{}", name))
    }

    fn blob() -> Bytes {
        Bytes::from(MetadataRoot::new("v4.0.30319").encode())
    }

    fn with_metadata(name: &str) -> StaticModule {
        StaticModule::new(id(name)).with_metadata(blob())
    }

    fn displays(refs: &[MetadataReference]) -> Vec<&str> {
        refs.iter().map(|r| r.display()).collect()
    }

    struct UnreadableModule(ModuleIdentity);

    impl LoadedModule for UnreadableModule {
        fn identity(&self) -> &ModuleIdentity {
            &self.0
        }

        fn static_references(&self) -> Vec<ModuleIdentity> {
            Vec::new()
        }

        fn raw_metadata(&self) -> Result<Option<Bytes>, ModuleError> {
            Err(ModuleError::MetadataUnavailable("view not mapped".to_string()))
        }
    }

    fn usable_manifest() -> DependencyManifest {
        DependencyManifest::new("App", "1.0.0").with_library(CompileLibrary {
            name: "Lib".to_string(),
            version: "1.0.0".to_string(),
            paths: Vec::new(),
        })
    }

    #[test]
    fn test_snapshot_skips_modules_without_metadata() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").into_rc();
        registry.insert_loaded(root.clone()).unwrap();
        registry.insert_loaded(StaticModule::new(id("Dynamic")).into_rc()).unwrap();
        registry.insert_loaded(with_metadata("Lib").into_rc()).unwrap();

        let resolver = ReferenceResolver::new(registry);
        let refs = resolver.resolve(&root).unwrap();
        assert_eq!(displays(&refs), vec!["App", "Lib"]);
    }

    #[test]
    fn test_extraction_failure_is_absorbed() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").into_rc();
        registry.insert_loaded(root.clone()).unwrap();
        registry
            .insert_loaded(Arc::new(UnreadableModule(id("Broken"))))
            .unwrap();

        let resolver = ReferenceResolver::new(registry);
        let refs = resolver.resolve(&root).unwrap();
        assert_eq!(displays(&refs), vec!["App"]);
    }

    #[test]
    fn test_malformed_blob_is_fatal() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").into_rc();
        registry.insert_loaded(root.clone()).unwrap();
        registry
            .insert_loaded(
                StaticModule::new(id("Garbage"))
                    .with_metadata(Bytes::from_static(b"not metadata at all"))
                    .into_rc(),
            )
            .unwrap();

        let resolver = ReferenceResolver::new(registry);
        let err = resolver.resolve(&root).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidMetadataBlob { ref module, .. } if module == "Garbage"
        ));
    }

    #[test]
    fn test_additional_references_appended_with_duplicates() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").into_rc();
        registry.insert_loaded(root.clone()).unwrap();

        let duplicate = MetadataReference::from_bytes("App", blob()).unwrap();
        let resolver = ReferenceResolver::with_additional_references(
            registry,
            Some(HashSet::from([duplicate.clone()])),
        )
        .unwrap();

        let refs = resolver.resolve(&root).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], duplicate);
        assert_eq!(refs[1], duplicate);
    }

    #[test]
    fn test_null_configuration_rejected() {
        let registry: Arc<dyn ModuleRegistry> = Arc::new(InMemoryRegistry::new());

        let err = ReferenceResolver::with_additional_references(registry.clone(), None)
            .err()
            .unwrap();
        assert!(matches!(err, ResolveError::NullConfiguration("additional_references")));

        let err = ReferenceResolver::with_configuration(registry, Some(HashSet::new()), None)
            .err()
            .unwrap();
        assert!(matches!(err, ResolveError::NullConfiguration("excluded_modules")));
    }

    #[test]
    fn test_transitive_strategy_walks_from_root() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").with_reference(id("Lib")).into_rc();
        registry.insert_loaded(root.clone()).unwrap();
        registry.insert_loaded(with_metadata("Unrelated").into_rc()).unwrap();
        registry
            .insert_loadable(with_metadata("Lib").with_reference(id("Lib.Tests")).into_rc())
            .unwrap();
        registry.insert_loadable(with_metadata("Lib.Tests").into_rc()).unwrap();
        registry.insert_manifest(root.identity(), usable_manifest()).unwrap();

        let mut resolver =
            ReferenceResolver::new(registry.clone()).with_strategy(ResolutionStrategy::Transitive);
        resolver.excluded_modules_mut().insert("Tests");

        let refs = resolver.resolve(&root).unwrap();
        assert_eq!(displays(&refs), vec!["App", "Lib"]);
        assert!(!registry.is_loaded("mem://Lib.Tests"));
    }

    #[test]
    fn test_transitive_strategy_falls_back_without_usable_manifest() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").into_rc();
        registry.insert_loaded(root.clone()).unwrap();
        registry.insert_loaded(with_metadata("Unrelated").into_rc()).unwrap();
        registry
            .insert_manifest(root.identity(), DependencyManifest::new("App", "1.0.0"))
            .unwrap();

        let resolver =
            ReferenceResolver::new(registry).with_strategy(ResolutionStrategy::Transitive);
        let refs = resolver.resolve(&root).unwrap();
        assert_eq!(displays(&refs), vec!["App", "Unrelated"]);
    }

    #[test]
    fn test_snapshot_strategy_ignores_manifest() {
        let registry = Arc::new(InMemoryRegistry::new());
        let root = with_metadata("App").into_rc();
        registry.insert_loaded(root.clone()).unwrap();
        registry.insert_loaded(with_metadata("Unrelated").into_rc()).unwrap();

        let resolver = ReferenceResolver::new(registry);
        let manifest = usable_manifest();
        let refs = resolver.resolve_with_manifest(&root, Some(&manifest)).unwrap();
        assert_eq!(displays(&refs), vec!["App", "Unrelated"]);
    }
}
