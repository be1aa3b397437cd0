//! Metadata reference resolution
//!
//! Given a root module, produces the metadata handles a just-in-time
//! compiler needs to compile code that calls into that module and everything
//! it depends on.

pub mod error;
pub mod exclusion;
pub mod manager;
pub mod metadata;
pub mod walker;

pub use error::ResolveError;
pub use exclusion::{ExclusionMatch, ExclusionSet};
pub use manager::{MetadataReferenceManager, ReferenceResolver, ResolverOptions};
pub use metadata::{extract_metadata_handle, MetadataReference, MetadataRoot};
pub use walker::{TransitiveWalker, VisitedSet};
