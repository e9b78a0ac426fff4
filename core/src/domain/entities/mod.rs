//! Domain entities representing core business objects.

pub mod otp_session;
pub mod reset_request;

// Re-export commonly used types
pub use otp_session::{OtpSession, SessionStatus, RETENTION_GRACE_SECONDS};
pub use reset_request::ResetRequest;
