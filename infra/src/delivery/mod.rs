//! Delivery provider implementations
//!
//! The provider is selected once at start-up; the verification service only
//! sees the `DeliveryProvider` trait.

pub mod failover;
pub mod gateway;
pub mod log_provider;

#[cfg(test)]
mod tests;

pub use failover::FailoverDeliveryProvider;
pub use gateway::HttpGatewayProvider;
pub use log_provider::LogDeliveryProvider;

use std::sync::Arc;
use std::time::Duration;

use og_core::services::verification::DeliveryProvider;
use og_shared::config::{DeliveryConfig, DeliveryProviderKind};

use crate::InfrastructureError;

/// Create the configured delivery provider
///
/// # Returns
/// * `Ok(Arc<dyn DeliveryProvider>)` - Ready provider
/// * `Err(InfrastructureError::Config)` - A gateway was selected without complete credentials
pub fn build_delivery_provider(config: &DeliveryConfig) -> Result<Arc<dyn DeliveryProvider>, InfrastructureError> {
    match config.provider {
        DeliveryProviderKind::Log => {
            tracing::info!(provider = "log", "Codes are logged, not delivered");
            Ok(Arc::new(LogDeliveryProvider::new()))
        }
        DeliveryProviderKind::Gateway => {
            let gateway = HttpGatewayProvider::new("gateway", config.gateway.clone())?;
            Ok(Arc::new(gateway))
        }
        DeliveryProviderKind::Failover => {
            let backup_config = config.backup_gateway.clone().ok_or_else(|| {
                InfrastructureError::Config("failover provider requires `backup_gateway`".to_string())
            })?;
            let primary = HttpGatewayProvider::new("primary", config.gateway.clone())?;
            let backup = HttpGatewayProvider::new("backup", backup_config)?;
            Ok(Arc::new(FailoverDeliveryProvider::new(
                Arc::new(primary),
                Arc::new(backup),
                Duration::from_secs(config.failover_recovery_seconds),
            )))
        }
    }
}
