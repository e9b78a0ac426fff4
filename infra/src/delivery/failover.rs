//! Failover delivery provider
//!
//! Sends through a primary provider and falls back to a backup when the
//! primary fails. After a failure the primary is skipped until the recovery
//! timeout has elapsed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use og_core::services::verification::{DeliveryError, DeliveryProvider, DeliveryReceipt};

/// State tracking for failover
#[derive(Debug, Clone, Default)]
struct FailoverState {
    /// Whether we're currently using the backup
    using_backup: bool,
    /// When the primary last failed
    last_primary_failure: Option<Instant>,
    /// Number of consecutive failures on primary
    primary_failure_count: u32,
}

/// Provider with automatic failover
pub struct FailoverDeliveryProvider {
    primary: Arc<dyn DeliveryProvider>,
    backup: Arc<dyn DeliveryProvider>,
    state: RwLock<FailoverState>,
    /// How long to wait before retrying primary after failure
    recovery_timeout: Duration,
}

impl FailoverDeliveryProvider {
    /// Create a new failover provider
    ///
    /// # Arguments
    ///
    /// * `primary` - The provider to use while it works
    /// * `backup` - The provider to fail over to
    /// * `recovery_timeout` - How long to wait before retrying the primary
    pub fn new(
        primary: Arc<dyn DeliveryProvider>,
        backup: Arc<dyn DeliveryProvider>,
        recovery_timeout: Duration,
    ) -> Self {
        info!(
            "Initializing failover delivery with {} (primary) and {} (backup)",
            primary.provider_name(),
            backup.provider_name()
        );

        Self {
            primary,
            backup,
            state: RwLock::new(FailoverState::default()),
            recovery_timeout,
        }
    }

    /// Whether the backup is currently preferred
    pub async fn is_using_backup(&self) -> bool {
        self.state.read().await.using_backup
    }

    /// Check if we should try the primary again
    async fn should_try_primary(&self) -> bool {
        let state = self.state.read().await;

        if !state.using_backup {
            return true;
        }

        match state.last_primary_failure {
            Some(last_failure) => last_failure.elapsed() > self.recovery_timeout,
            None => true,
        }
    }

    /// Record a primary failure and switch to backup
    async fn record_primary_failure(&self) {
        let mut state = self.state.write().await;

        state.primary_failure_count += 1;
        state.last_primary_failure = Some(Instant::now());

        if !state.using_backup {
            warn!(
                "Primary delivery provider ({}) failed, switching to backup ({})",
                self.primary.provider_name(),
                self.backup.provider_name()
            );
            state.using_backup = true;
        }
    }

    /// Record a successful primary send
    async fn record_primary_success(&self) {
        let mut state = self.state.write().await;

        if state.using_backup {
            info!(
                "Primary delivery provider ({}) recovered, switching back from backup",
                self.primary.provider_name()
            );
        }

        *state = FailoverState::default();
    }
}

#[async_trait]
impl DeliveryProvider for FailoverDeliveryProvider {
    async fn send(&self, destination: &str, message: &str) -> Result<DeliveryReceipt, DeliveryError> {
        if self.should_try_primary().await {
            match self.primary.send(destination, message).await {
                Ok(receipt) => {
                    self.record_primary_success().await;
                    return Ok(receipt);
                }
                Err(e) => {
                    error!(
                        "Primary delivery provider ({}) failed: {}",
                        self.primary.provider_name(),
                        e
                    );
                    self.record_primary_failure().await;
                }
            }
        }

        self.backup.send(destination, message).await.map_err(|e| {
            error!(
                "Backup delivery provider ({}) also failed: {}",
                self.backup.provider_name(),
                e
            );
            e
        })
    }

    fn provider_name(&self) -> &str {
        "failover"
    }
}
