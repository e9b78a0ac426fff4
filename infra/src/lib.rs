//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for OtpGate, following
//! Clean Architecture principles. It provides the concrete collaborators the
//! verification service is wired with at start-up.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Store**: In-memory and Redis-backed session stores
//! - **Cache**: Redis client with retry logic and script execution
//! - **Delivery**: Log stub, HTTP messaging gateway and failover providers
//! - **Credentials**: In-memory and MySQL credential updaters (bcrypt hashes)
//!
//! ## Features
//!
//! - `mysql`: Enable the MySQL credential updater (default)
//! - `redis-store`: Enable the Redis session store (default)

use og_core::errors::DomainError;

/// Cache module - Redis client and operations
#[cfg(feature = "redis-store")]
pub mod cache;

/// Credential updaters
pub mod credentials;

/// Delivery providers
pub mod delivery;

/// Session stores
pub mod store;

pub use credentials::build_credential_updater;
pub use delivery::build_delivery_provider;
pub use store::build_session_store;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Record (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Database(e) => DomainError::Credential {
                message: e.to_string(),
            },
            InfrastructureError::Cache(_) | InfrastructureError::Serialization(_) => {
                DomainError::Store {
                    message: err.to_string(),
                }
            }
            other => DomainError::Internal {
                message: other.to_string(),
            },
        }
    }
}
