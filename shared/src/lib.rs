//! Shared utilities and common types for the OtpGate server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and loading
//! - Error response structures
//! - Identifier utilities (phone/email validation, masking)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, Environment,
    CacheConfig, CredentialConfig, DeliveryConfig, LoggingConfig, OtpConfig,
    ServerConfig, StoreConfig,
};
pub use errors::{ErrorResponse, error_codes};
pub use utils::identifier;
