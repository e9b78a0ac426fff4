//! Outcome errors of the one-time code flow
//!
//! These are expected conditions, not failures of the system. Each carries the
//! remaining time, attempts or budget the caller needs to render a response.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid identifier")]
    InvalidIdentifier,

    #[error("Resend cooldown active: retry after {retry_after_seconds} seconds")]
    CooldownActive { retry_after_seconds: u64 },

    #[error("Maximum resends reached ({max_resends})")]
    MaxResendsReached { max_resends: u32 },

    #[error("Session expired")]
    ExpiredSession,

    #[error("Maximum attempts exceeded")]
    MaxAttemptsExceeded,

    #[error("Invalid code: {attempts_remaining} attempts remaining")]
    InvalidCode { attempts_remaining: u32 },

    #[error("Malformed code: expected {expected_length} digits")]
    MalformedCode { expected_length: usize },

    #[error("Delivery failed after {attempts} attempts")]
    DeliveryFailure { attempts: u32 },

    #[error("Session not found")]
    SessionNotFound,

    #[error("Already consumed")]
    AlreadyConsumed,

    #[error("Session not verified")]
    NotVerified,

    #[error("Invalid reset token")]
    InvalidResetToken,
}
