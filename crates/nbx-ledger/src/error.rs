use nbx_types::Address;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("entry not found: {0}")]
    NotFound(Address),

    #[error("entry {address} is corrupt: {reason}")]
    CorruptEntry { address: Address, reason: String },

    #[error("entry manifest is not fully resolved: slot '{slot}'")]
    Unresolved { slot: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
