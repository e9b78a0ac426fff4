//! Development delivery provider
//!
//! Accepts every message and logs only the masked destination. The message
//! itself carries the code and is never logged.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use og_core::services::verification::{DeliveryError, DeliveryProvider, DeliveryReceipt};
use og_shared::utils::identifier::mask_identifier;

/// Provider that delivers nothing
#[derive(Debug, Default)]
pub struct LogDeliveryProvider {
    /// Counter for generating message ids
    message_counter: AtomicU64,
}

impl LogDeliveryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages accepted so far
    pub fn sent_count(&self) -> u64 {
        self.message_counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryProvider for LogDeliveryProvider {
    async fn send(&self, destination: &str, message: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let sequence = self.message_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let message_id = format!("log-{}", sequence);

        info!(
            destination = %mask_identifier(destination),
            message_id = %message_id,
            message_length = message.len(),
            event = "delivery_logged",
            "Message accepted by log provider"
        );

        Ok(DeliveryReceipt {
            message_id,
            provider: self.provider_name().to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "log"
    }
}
