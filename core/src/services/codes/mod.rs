//! Secure code and token generation
//!
//! All randomness comes from the operating system CSPRNG. There is no
//! fallback: when the entropy source fails the caller gets
//! `DomainError::Entropy` and must abort.

mod generator;

pub use generator::{
    constant_time_equals, digest, generate_numeric_code, generate_opaque_token,
    MAX_CODE_LENGTH,
};
