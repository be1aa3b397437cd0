//! Metadata handles and raw metadata extraction
//!
//! A `MetadataReference` is an immutable, reference-counted view of a
//! module's metadata blob. It is built from the bytes the module already has
//! mapped, so modules with no backing file (in-memory or bundled) still
//! resolve. The underlying `Bytes` keeps the blob alive for as long as any
//! handle exists.

use bytes::Bytes;
use std::fmt;
use std::path::Path;

use crate::module::traits::LoadedModule;
use crate::resolver::error::ResolveError;

/// `BSJB`, little-endian
pub const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// Fixed part of the metadata root preceding the version string
const ROOT_HEADER_LEN: usize = 16;

/// Parsed metadata root header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataRoot {
    pub major_version: u16,
    pub minor_version: u16,
    /// Runtime version string, trailing NULs removed
    pub version: String,
    pub flags: u16,
    pub stream_count: u16,
}

impl MetadataRoot {
    /// Root header with version 1.1 and no streams
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            major_version: 1,
            minor_version: 1,
            version: version.into(),
            flags: 0,
            stream_count: 0,
        }
    }

    /// Parse the root header at the start of a metadata blob
    pub fn parse(blob: &[u8]) -> Result<Self, String> {
        if blob.len() < ROOT_HEADER_LEN {
            return Err(format!(
                "blob of {} bytes is shorter than the metadata root header",
                blob.len()
            ));
        }

        let signature = read_u32(blob, 0);
        if signature != METADATA_SIGNATURE {
            return Err(format!("bad metadata signature 0x{:08X}", signature));
        }

        let major_version = read_u16(blob, 4);
        let minor_version = read_u16(blob, 6);
        let version_len = read_u32(blob, 12) as usize;

        let version_end = ROOT_HEADER_LEN
            .checked_add(version_len)
            .ok_or_else(|| "version string length overflows".to_string())?;
        // flags and stream count follow the version string
        if version_end + 4 > blob.len() {
            return Err(format!(
                "version string length {} runs past the end of a {} byte blob",
                version_len,
                blob.len()
            ));
        }

        let raw_version = &blob[ROOT_HEADER_LEN..version_end];
        let trimmed = match raw_version.iter().position(|&b| b == 0) {
            Some(nul) => &raw_version[..nul],
            None => raw_version,
        };

        Ok(Self {
            major_version,
            minor_version,
            version: String::from_utf8_lossy(trimmed).into_owned(),
            flags: read_u16(blob, version_end),
            stream_count: read_u16(blob, version_end + 2),
        })
    }

    /// Encode this root header (version string NUL-padded to 4 bytes)
    pub fn encode(&self) -> Vec<u8> {
        let padded_len = (self.version.len() + 1 + 3) & !3;
        let mut out = Vec::with_capacity(ROOT_HEADER_LEN + padded_len + 4);
        out.extend_from_slice(&METADATA_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.major_version.to_le_bytes());
        out.extend_from_slice(&self.minor_version.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(padded_len as u32).to_le_bytes());
        out.extend_from_slice(self.version.as_bytes());
        out.resize(ROOT_HEADER_LEN + padded_len, 0);
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.stream_count.to_le_bytes());
        out
    }
}

fn read_u16(blob: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([blob[at], blob[at + 1]])
}

fn read_u32(blob: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([blob[at], blob[at + 1], blob[at + 2], blob[at + 3]])
}

/// Immutable metadata handle handed to the compiler
///
/// Cloning is cheap; equality compares display name and bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MetadataReference {
    display: String,
    root: MetadataRoot,
    blob: Bytes,
}

impl MetadataReference {
    /// Wrap a metadata blob, validating its root header
    pub fn from_bytes(
        display: impl Into<String>,
        blob: impl Into<Bytes>,
    ) -> Result<Self, ResolveError> {
        let display = display.into();
        let blob = blob.into();
        let root = MetadataRoot::parse(&blob).map_err(|reason| ResolveError::InvalidMetadataBlob {
            module: display.clone(),
            reason,
        })?;
        Ok(Self { display, root, blob })
    }

    /// Read a metadata blob from disk
    ///
    /// The display name is the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let display = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let blob = std::fs::read(path).map_err(|source| ResolveError::ReferenceFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(display, blob)
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn root(&self) -> &MetadataRoot {
        &self.root
    }

    /// Raw metadata bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.blob
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}

impl fmt::Debug for MetadataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataReference")
            .field("display", &self.display)
            .field("version", &self.root.version)
            .field("len", &self.blob.len())
            .finish()
    }
}

/// Extract a metadata handle from a loaded module
///
/// Returns `Ok(None)` when the module exposes no metadata view (or an empty
/// one), `ExtractionFailed` when the view exists but cannot be read, and
/// `InvalidMetadataBlob` when the bytes are malformed.
pub fn extract_metadata_handle(
    module: &dyn LoadedModule,
) -> Result<Option<MetadataReference>, ResolveError> {
    let identity = module.identity();
    let blob = module
        .raw_metadata()
        .map_err(|source| ResolveError::ExtractionFailed {
            module: identity.name.clone(),
            source,
        })?;

    match blob {
        Some(blob) if !blob.is_empty() => {
            MetadataReference::from_bytes(identity.name.clone(), blob).map(Some)
        }
        _ => Ok(None),
    }
}
