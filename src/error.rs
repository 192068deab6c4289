use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for xen operations
pub type Result<T> = std::result::Result<T, XenError>;

/// Unified error type for all xen operations
#[derive(Debug, Error)]
pub enum XenError {
    // Container stream errors
    #[error("Invalid magic header: expected SXEN or DXEN, found {found:02X?}")]
    BadMagicHeader { found: [u8; 4] },

    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    #[error("VLQ value does not fit in 64 bits")]
    VlqOverflow,

    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    // Write path errors
    #[error("Cannot read source file {}: {source}", path.display())]
    SourceFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Embedded file {directory}/{file} has no source archive to copy from")]
    MissingEmbeddedSource { directory: String, file: String },

    // Extraction errors
    #[error("Extraction source {} unavailable: {source}", path.display())]
    ExtractionSourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File {directory}/{file} is not embedded in a container")]
    NotEmbedded { directory: String, file: String },

    #[error("Unsafe entry path: {0}")]
    UnsafePath(String),

    #[error("Extraction target {} was already written by another entry", path.display())]
    TargetCollision { path: PathBuf },

    // Lookup errors
    #[error("Directory not found in container: {0}")]
    DirectoryNotFound(String),

    #[error("File not found in container: {directory}/{file}")]
    FileNotFound { directory: String, file: String },

    // Manifest and configuration errors
    #[error("Invalid manifest at line {line}: {message}")]
    InvalidManifest { line: usize, message: String },

    #[error("Unknown container mode: {0}")]
    UnknownMode(String),

    #[error("Unknown encryption method: {0}")]
    UnknownEncryption(String),

    #[error("TOML error: {0}")]
    TomlError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl XenError {
    /// True for the errors a malformed or truncated container stream produces
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            XenError::BadMagicHeader { .. }
                | XenError::UnexpectedEndOfStream
                | XenError::VlqOverflow
                | XenError::CorruptContainer(_)
        )
    }
}

impl From<toml::de::Error> for XenError {
    fn from(err: toml::de::Error) -> Self {
        XenError::TomlError(err.to_string())
    }
}

impl From<toml::ser::Error> for XenError {
    fn from(err: toml::ser::Error) -> Self {
        XenError::TomlError(err.to_string())
    }
}
