//! Request bodies of the HTTP surface
//!
//! Responses reuse the serializable result types of `og_core`.

pub mod otp;
pub mod password;

pub use otp::{RequestCodeRequest, ResendCodeRequest, VerifyCodeRequest};
pub use password::{ResetPasswordRequest, ResetTokenRequest};
