//! Error types for login token validation
//!
//! Every failure here is an expected condition from the caller's point of
//! view: a rejected token simply restarts the auto-login cycle. The variants
//! exist so the reason can be logged.

use thiserror::Error;

/// Token validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not a structurally valid JWT
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Signature does not match the shared secret, or the algorithm is wrong
    #[error("Invalid signature")]
    InvalidSignature,

    /// Expiration time has passed
    #[error("Token has expired")]
    Expired,

    /// Not-before time has not been reached yet
    #[error("Token is not valid yet")]
    NotYetValid,

    /// Token is missing a required claim
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// Validator configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

impl TokenError {
    /// Short machine-readable reason, used as a log field.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::NotYetValid => "not_yet_valid",
            TokenError::MissingClaim(_) => "missing_claim",
            TokenError::Config(_) => "config",
        }
    }

    /// Whether the failure was caused by the validity window rather than
    /// the token's integrity.
    pub fn is_timing(&self) -> bool {
        matches!(self, TokenError::Expired | TokenError::NotYetValid)
    }
}
