use nbx_types::{Token, TokenLevel};
use thiserror::Error;

/// Errors from token derivation and verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token at {level} level: expected {expected}, found {found}")]
    InvalidToken {
        level: TokenLevel,
        expected: Token,
        found: Token,
    },

    #[error("slot '{slot}' is not resolved")]
    Unresolved { slot: String },

    #[error("token shape does not match manifest: {reason}")]
    ShapeMismatch { reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type TokenResult<T> = Result<T, TokenError>;
