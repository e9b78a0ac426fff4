//! Credential updaters
//!
//! New credentials are validated, hashed with bcrypt off the async runtime
//! and written to the configured backend. The plaintext never leaves this
//! module.

pub mod memory;
#[cfg(feature = "mysql")]
pub mod mysql;

pub use memory::InMemoryCredentialStore;
#[cfg(feature = "mysql")]
pub use self::mysql::MySqlCredentialUpdater;

use std::sync::Arc;

use og_core::errors::{DomainError, DomainResult};
use og_core::services::verification::CredentialUpdater;
use og_shared::config::{CredentialBackend, CredentialConfig};

use crate::InfrastructureError;

/// Build the configured credential updater
pub async fn build_credential_updater(
    config: &CredentialConfig,
) -> Result<Arc<dyn CredentialUpdater>, InfrastructureError> {
    match config.backend {
        CredentialBackend::Memory => {
            tracing::info!(backend = "memory", "Using in-memory credential store");
            Ok(Arc::new(InMemoryCredentialStore::new(
                config.bcrypt_cost,
                config.min_length,
            )))
        }
        #[cfg(feature = "mysql")]
        CredentialBackend::MySql => {
            let updater = MySqlCredentialUpdater::connect(config).await?;
            tracing::info!(backend = "mysql", "Using MySQL credential updater");
            Ok(Arc::new(updater))
        }
        #[cfg(not(feature = "mysql"))]
        CredentialBackend::MySql => Err(InfrastructureError::Config(
            "MySQL credential updater requires the `mysql` feature".to_string(),
        )),
    }
}

/// Reject credentials shorter than `min_length` characters
pub fn validate_credential(new_credential: &str, min_length: usize) -> DomainResult<()> {
    if new_credential.chars().count() < min_length {
        return Err(DomainError::Validation {
            message: format!("New password must be at least {} characters", min_length),
        });
    }
    Ok(())
}

/// Hash a credential with bcrypt on the blocking pool
pub async fn hash_credential(new_credential: &str, cost: u32) -> DomainResult<String> {
    let plaintext = new_credential.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Hashing task failed: {}", e),
        })?
        .map_err(|e| DomainError::Credential {
            message: format!("Failed to hash password: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credential_min_length() {
        assert!(validate_credential("longenough", 8).is_ok());
        assert!(matches!(
            validate_credential("short", 8),
            Err(DomainError::Validation { .. })
        ));
        // Counted in characters, not bytes
        assert!(validate_credential("ééééé", 6).is_err());
    }

    #[tokio::test]
    async fn test_hash_credential_verifies() {
        let hash = hash_credential("n3w-passw0rd", 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(bcrypt::verify("n3w-passw0rd", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_build_memory_updater() {
        let config = CredentialConfig {
            bcrypt_cost: 4,
            ..Default::default()
        };
        let updater = build_credential_updater(&config).await.unwrap();
        updater
            .update_credential("+97612345678", "n3w-passw0rd")
            .await
            .unwrap();
    }
}
