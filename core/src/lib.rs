//! # OtpGate Core
//!
//! Core domain layer for the OtpGate backend.
//! This crate contains the session entities, the code generator, the resend
//! policy and the verification state machine, together with the capability
//! traits (delivery, session storage, credential update) the infrastructure
//! layer implements.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
