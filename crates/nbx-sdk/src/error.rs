use nbx_assembler::AssemblyError;
use nbx_token::TokenError;
use nbx_types::TokenLevel;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] nbx_store::StoreError),

    #[error("bundle error: {0}")]
    Bundle(#[from] nbx_bundle::BundleError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("ledger error: {0}")]
    Ledger(#[from] nbx_ledger::LedgerError),

    #[error("{0}")]
    Assembly(#[from] AssemblyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Join(String),
}

impl SdkError {
    /// The token level named by an integrity failure, wherever it surfaced.
    pub fn invalid_level(&self) -> Option<TokenLevel> {
        match self {
            Self::Token(TokenError::InvalidToken { level, .. })
            | Self::Assembly(AssemblyError::Token(TokenError::InvalidToken { level, .. })) => {
                Some(*level)
            }
            _ => None,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
