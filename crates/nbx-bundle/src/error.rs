use nbx_types::BundleKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    /// Bad header, unknown kind tag, checksum failure, or a payload that
    /// disagrees with its header.
    #[error("invalid bundle format: {reason}")]
    Format { reason: String },

    #[error("unsupported bundle format version: {0}")]
    UnsupportedVersion(u32),

    #[error("bundle kind mismatch: expected {expected}, found {actual}")]
    KindMismatch {
        expected: BundleKind,
        actual: BundleKind,
    },

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("slot '{slot}' references missing resource '{path}'")]
    MissingResource { slot: String, path: String },

    #[error("resource '{path}' is not referenced by any slot")]
    OrphanResource { path: String },

    #[error("resource '{path}' is referenced by more than one slot")]
    DuplicateReference { path: String },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BundleError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }
}

pub type BundleResult<T> = Result<T, BundleError>;
