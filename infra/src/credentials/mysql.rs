//! MySQL credential updater
//!
//! Writes bcrypt hashes into an existing credentials table. Identifiers are
//! stored as SHA-256 hex digests so the table never holds raw phone numbers
//! or addresses:
//!
//! ```sql
//! CREATE TABLE user_credentials (
//!     identifier_hash CHAR(64) PRIMARY KEY,
//!     password_hash   VARCHAR(255) NOT NULL,
//!     updated_at      TIMESTAMP NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use std::str::FromStr;
use std::time::Duration;

use og_core::errors::{DomainError, DomainResult};
use og_core::services::verification::CredentialUpdater;
use og_shared::config::CredentialConfig;
use og_shared::utils::mask_identifier;

use super::{hash_credential, validate_credential};
use crate::InfrastructureError;

pub struct MySqlCredentialUpdater {
    pool: MySqlPool,
    bcrypt_cost: u32,
    min_length: usize,
}

impl MySqlCredentialUpdater {
    /// Open a connection pool for the configured database
    pub async fn connect(config: &CredentialConfig) -> Result<Self, InfrastructureError> {
        let connect_options = MySqlConnectOptions::from_str(&config.database_url)
            .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))?;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create database pool");
                InfrastructureError::Database(e)
            })?;

        Ok(Self::new(pool, config.bcrypt_cost, config.min_length))
    }

    pub fn new(pool: MySqlPool, bcrypt_cost: u32, min_length: usize) -> Self {
        Self {
            pool,
            bcrypt_cost,
            min_length,
        }
    }

    /// SHA-256 hex digest used as the row key
    pub fn hash_identifier(identifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl CredentialUpdater for MySqlCredentialUpdater {
    async fn update_credential(&self, identifier: &str, new_credential: &str) -> DomainResult<()> {
        validate_credential(new_credential, self.min_length)?;
        let password_hash = hash_credential(new_credential, self.bcrypt_cost).await?;

        let result = sqlx::query(
            "UPDATE user_credentials SET password_hash = ?, updated_at = ? WHERE identifier_hash = ?",
        )
        .bind(&password_hash)
        .bind(Utc::now())
        .bind(Self::hash_identifier(identifier))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                event = "credential_update_failed",
                identifier = %mask_identifier(identifier),
                "No credential row for identifier"
            );
            return Err(DomainError::Credential {
                message: "No account registered for identifier".to_string(),
            });
        }

        tracing::info!(
            event = "credential_updated",
            identifier = %mask_identifier(identifier),
            backend = "mysql",
            "Credential updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_hash_is_stable_hex() {
        let hash = MySqlCredentialUpdater::hash_identifier("+97612345678");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, MySqlCredentialUpdater::hash_identifier("+97612345678"));
        assert_ne!(hash, MySqlCredentialUpdater::hash_identifier("+97612345679"));
    }
}
