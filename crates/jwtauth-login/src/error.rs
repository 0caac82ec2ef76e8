//! Error types for the login flow
//!
//! Expected failures (bad tokens, unsafe target paths) never surface here;
//! they are answered with a redirect. A [`LoginError`] means the flow cannot
//! heal itself and the request must fail visibly.

use thiserror::Error;

/// Unrecoverable login failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The token names a user the host does not know
    #[error("Tried to log in with a user which does not exist: {0}")]
    UnknownUser(String),

    /// The session-establishment pipeline failed
    #[error("Internal login failure in step '{step}': {reason}")]
    PipelineFailed {
        /// Name of the step that failed
        step: String,
        /// Failure description
        reason: String,
    },
}

/// Result type for login operations.
pub type LoginResult<T> = Result<T, LoginError>;

impl LoginError {
    /// Both variants point at misconfiguration or a host defect.
    pub fn is_server_error(&self) -> bool {
        true
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            LoginError::UnknownUser(_) | LoginError::PipelineFailed { .. } => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LoginError::UnknownUser(_) => "UNKNOWN_USER",
            LoginError::PipelineFailed { .. } => "LOGIN_PIPELINE_FAILED",
        }
    }
}
