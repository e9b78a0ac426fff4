//! Route handlers
//!
//! - `otp` - code request, resend, verification and session status
//! - `password` - reset token issuance and credential reset
//! - `health` - liveness

pub mod health;
pub mod otp;
pub mod password;
