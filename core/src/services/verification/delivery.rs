//! Bounded retry around a delivery provider

use og_shared::utils::identifier::mask_identifier;

use crate::errors::OtpError;

use super::config::DeliveryRetryConfig;
use super::traits::{DeliveryError, DeliveryProvider, DeliveryReceipt};

/// Send `message`, retrying transient failures with exponential backoff
///
/// Every attempt is bounded by the send timeout, so the whole call is bounded
/// by `max_attempts * (send_timeout + max_backoff)`. Exhaustion is reported as
/// `OtpError::DeliveryFailure`.
pub async fn deliver_with_retry<D: DeliveryProvider + ?Sized>(
    provider: &D,
    destination: &str,
    message: &str,
    config: &DeliveryRetryConfig,
) -> Result<DeliveryReceipt, OtpError> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let outcome = match tokio::time::timeout(config.send_timeout(), provider.send(destination, message)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout),
        };

        match outcome {
            Ok(receipt) => {
                tracing::debug!(
                    destination = %mask_identifier(destination),
                    provider = %receipt.provider,
                    message_id = %receipt.message_id,
                    attempt = attempt,
                    event = "delivery_accepted",
                    "Message accepted by delivery provider"
                );
                return Ok(receipt);
            }
            Err(e) if e.is_retriable() && attempt < max_attempts => {
                let backoff = config.backoff_for(attempt);
                tracing::warn!(
                    destination = %mask_identifier(destination),
                    provider = provider.provider_name(),
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    event = "delivery_retry",
                    "Delivery attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    destination = %mask_identifier(destination),
                    provider = provider.provider_name(),
                    attempts = attempt,
                    error = %e,
                    event = "delivery_failed",
                    "Delivery failed"
                );
                return Err(OtpError::DeliveryFailure { attempts: attempt });
            }
        }
    }
}
