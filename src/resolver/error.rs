//! Resolution errors

use std::path::PathBuf;
use thiserror::Error;

use crate::module::traits::ModuleError;

/// Errors raised while resolving metadata references
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No usable dependency manifest; selects the snapshot strategy and is
    /// never returned from `resolve`
    #[error("Dependency manifest unavailable for {0}")]
    ManifestUnavailable(String),

    /// A module's metadata view could not be obtained
    #[error("Metadata extraction failed for {module}: {source}")]
    ExtractionFailed {
        module: String,
        #[source]
        source: ModuleError,
    },

    /// Metadata bytes are malformed
    #[error("Invalid metadata blob for {module}: {reason}")]
    InvalidMetadataBlob { module: String, reason: String },

    /// A required configuration collection is missing
    #[error("Required configuration is missing: {0}")]
    NullConfiguration(&'static str),

    /// Configuration rejected before any resolution
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An additional reference file could not be read
    #[error("Failed to read reference file {}: {source}", path.display())]
    ReferenceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry failure outside of per-module extraction
    #[error(transparent)]
    Module(#[from] ModuleError),
}
