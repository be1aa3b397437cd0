//! Module registry and discovery
//!
//! Concrete registry, module descriptors, discovery and dependency manifests.

pub mod dependency_manifest;
pub mod discovery;
pub mod manifest;
pub mod memory;

pub use dependency_manifest::{CompileLibrary, DependencyManifest};
pub use discovery::{DiscoveredModule, ModuleDiscovery};
pub use manifest::ModuleManifest;
pub use memory::{InMemoryRegistry, StaticModule};
