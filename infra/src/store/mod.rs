//! Session store implementations
//!
//! - `memory` - process-local map; one process only
//! - `redis` - shared store for multi-process deployments

pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;

pub use memory::InMemorySessionStore;
#[cfg(feature = "redis-store")]
pub use self::redis::RedisSessionStore;

use std::sync::Arc;

use og_core::services::verification::SessionStore;
use og_shared::config::{StoreBackend, StoreConfig};

use crate::InfrastructureError;

/// Build the configured session store
pub async fn build_session_store(config: &StoreConfig) -> Result<Arc<dyn SessionStore>, InfrastructureError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!(backend = "memory", "Using in-memory session store");
            Ok(Arc::new(InMemorySessionStore::new()))
        }
        #[cfg(feature = "redis-store")]
        StoreBackend::Redis => {
            let client = crate::cache::RedisClient::new(config.redis.clone()).await?;
            tracing::info!(backend = "redis", "Using Redis session store");
            Ok(Arc::new(RedisSessionStore::new(client)))
        }
        #[cfg(not(feature = "redis-store"))]
        StoreBackend::Redis => Err(InfrastructureError::Config(
            "Redis session store requires the `redis-store` feature".to_string(),
        )),
    }
}
