//! Process-local credential store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use og_core::errors::DomainResult;
use og_core::services::verification::CredentialUpdater;
use og_shared::utils::mask_identifier;

use super::{hash_credential, validate_credential};

/// Keeps bcrypt hashes in memory, keyed by normalized identifier
pub struct InMemoryCredentialStore {
    hashes: RwLock<HashMap<String, String>>,
    bcrypt_cost: u32,
    min_length: usize,
}

impl InMemoryCredentialStore {
    pub fn new(bcrypt_cost: u32, min_length: usize) -> Self {
        Self {
            hashes: RwLock::new(HashMap::new()),
            bcrypt_cost,
            min_length,
        }
    }

    /// Check a plaintext credential against the stored hash
    pub async fn verify(&self, identifier: &str, credential: &str) -> bool {
        let hashes = self.hashes.read().await;
        match hashes.get(identifier) {
            Some(hash) => bcrypt::verify(credential, hash).unwrap_or(false),
            None => false,
        }
    }

    /// Number of identifiers with a stored credential
    pub async fn len(&self) -> usize {
        self.hashes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialUpdater for InMemoryCredentialStore {
    async fn update_credential(&self, identifier: &str, new_credential: &str) -> DomainResult<()> {
        validate_credential(new_credential, self.min_length)?;
        let hash = hash_credential(new_credential, self.bcrypt_cost).await?;

        self.hashes.write().await.insert(identifier.to_string(), hash);

        tracing::info!(
            event = "credential_updated",
            identifier = %mask_identifier(identifier),
            backend = "memory",
            "Credential updated"
        );
        Ok(())
    }
}
