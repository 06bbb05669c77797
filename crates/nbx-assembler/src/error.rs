use nbx_bundle::BundleError;
use nbx_ledger::LedgerError;
use nbx_store::StoreError;
use nbx_token::TokenError;
use nbx_types::{Address, BundleKind};
use thiserror::Error;

/// Errors from assembling or unpacking a bundle tree.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("bundle nesting depth {depth} exceeds the limit of {max}")]
    RecursionLimitExceeded { depth: usize, max: usize },

    #[error("entry {address} is a {actual} bundle, expected {expected}")]
    UnexpectedKind {
        address: Address,
        expected: BundleKind,
        actual: BundleKind,
    },
}

pub type AssemblyResult<T> = Result<T, AssemblyError>;
