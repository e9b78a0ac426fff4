//! Domain-specific error types and error handling.

mod types;

pub use types::OtpError;

use thiserror::Error;

/// Core domain errors
///
/// `Otp` carries the expected outcomes of the verification flow. Every other
/// variant aborts the operation without a partial state change being reported
/// as success.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error("Entropy source unavailable: {message}")]
    Entropy { message: String },

    #[error("Session store error: {message}")]
    Store { message: String },

    #[error("Concurrent modification of session {session_id}")]
    Conflict { session_id: String },

    #[error("Credential update failed: {message}")]
    Credential { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    /// Whether the error aborts the operation as a system failure rather than
    /// being an expected outcome the caller can act on
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DomainError::Otp(_) | DomainError::Validation { .. })
    }

    /// The flow outcome, if this is one
    pub fn as_otp(&self) -> Option<&OtpError> {
        match self {
            DomainError::Otp(err) => Some(err),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
