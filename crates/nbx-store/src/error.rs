use nbx_types::Address;

use crate::object::ObjectKind;

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(Address),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {address}: computed {computed}")]
    HashMismatch { address: Address, computed: Address },

    /// Reassembled asset length disagrees with the declared length.
    #[error("size mismatch for asset {address}: declared {expected} bytes, reassembled {actual}")]
    SizeMismatch {
        address: Address,
        expected: u64,
        actual: u64,
    },

    /// An object exists under the address but has the wrong kind.
    #[error("object {address} is a {actual}, expected {expected}")]
    WrongKind {
        address: Address,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {address}: {reason}")]
    CorruptObject { address: Address, reason: String },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
