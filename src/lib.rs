//! Reference Resolver - metadata references for just-in-time template compilation
//!
//! When a template is compiled at runtime, the compiler must see the metadata
//! of every module the generated code may call into. This crate computes that
//! set from a live, mutable module graph owned by the host.
//!
//! ## Design Principles
//!
//! 1. **Injected registry**: the host's module loader is a `ModuleRegistry`
//!    capability, never ambient global state
//! 2. **Cycle safety**: transitive walks track visited codebases and use an
//!    explicit stack, so cyclic and very deep graphs terminate
//! 3. **In-memory metadata**: handles are built from the bytes a module
//!    already has mapped, so bundled modules without a file path resolve
//! 4. **Per-module tolerance**: a module whose metadata cannot be read is left
//!    out; only malformed metadata aborts a resolution
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reference_resolver::module::{InMemoryRegistry, ModuleIdentity, StaticModule};
//! use reference_resolver::resolver::{MetadataReferenceManager, MetadataRoot, ReferenceResolver};
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! let root = StaticModule::new(ModuleIdentity::new("App", "mem://App"))
//!     .with_metadata(MetadataRoot::new("v4.0.30319").encode())
//!     .into_rc();
//! registry.insert_loaded(root.clone()).unwrap();
//!
//! let resolver = ReferenceResolver::new(registry);
//! let references = resolver.resolve(&root).unwrap();
//! assert_eq!(references.len(), 1);
//! ```

pub mod config;
pub mod module;
pub mod resolver;
pub mod utils;

pub use config::{LoggingConfig, ResolutionStrategy, ResolverConfig};
pub use module::{
    DependencyManifest, InMemoryRegistry, LoadedModule, ModuleError, ModuleIdentity, ModuleRc,
    ModuleRegistry, StaticModule,
};
pub use resolver::{
    ExclusionMatch, ExclusionSet, MetadataReference, MetadataReferenceManager, ReferenceResolver,
    ResolveError, ResolverOptions, TransitiveWalker, VisitedSet,
};
