//! Module abstraction for reference resolution
//!
//! The host owns module lifetime. This crate observes modules through two
//! capabilities:
//!
//! - **`LoadedModule`**: identity, statically declared references and a view
//!   of the module's metadata bytes
//! - **`ModuleRegistry`**: load a module by identity, enumerate the loaded set,
//!   and optionally hand out a compile-time dependency manifest

pub mod registry;
pub mod traits;
pub mod validation;

pub use registry::{DependencyManifest, InMemoryRegistry, ModuleDiscovery, StaticModule};
pub use traits::{LoadedModule, ModuleError, ModuleIdentity, ModuleRc, ModuleRegistry};
