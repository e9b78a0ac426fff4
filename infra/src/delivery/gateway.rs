//! HTTP messaging gateway provider
//!
//! Speaks the Twilio Messages API: a form post to
//! `{base_url}/Accounts/{account_sid}/Messages.json` with basic auth. Any
//! gateway exposing the same contract works.
//!
//! Transport errors, timeouts, 429 and 5xx responses are reported as
//! retriable; other 4xx responses as rejections. Retrying is left to the
//! caller.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use og_core::services::verification::{DeliveryError, DeliveryProvider, DeliveryReceipt};
use og_shared::config::GatewayConfig;
use og_shared::utils::identifier::mask_identifier;

use crate::InfrastructureError;

/// Successful gateway response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

/// Provider sending SMS through an HTTP gateway
pub struct HttpGatewayProvider {
    name: String,
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGatewayProvider {
    /// Create a gateway provider
    ///
    /// # Arguments
    /// * `name` - Provider name used in logs and receipts
    /// * `config` - Gateway endpoint and credentials
    pub fn new(name: impl Into<String>, config: GatewayConfig) -> Result<Self, InfrastructureError> {
        let name = name.into();
        if !config.is_complete() {
            return Err(InfrastructureError::Config(format!(
                "gateway `{}` requires base_url, account_sid, auth_token and from",
                name
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            provider = %name,
            from = %mask_identifier(&config.from),
            "Messaging gateway initialized"
        );

        Ok(Self { name, client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

/// Map a non-success response to a delivery error
pub(crate) fn classify_status(status: StatusCode, body: &str) -> DeliveryError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DeliveryError::Transport(detail)
    } else {
        DeliveryError::Rejected(detail)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[async_trait]
impl DeliveryProvider for HttpGatewayProvider {
    async fn send(&self, destination: &str, message: &str) -> Result<DeliveryReceipt, DeliveryError> {
        if destination.contains('@') {
            return Err(DeliveryError::Rejected(
                "SMS gateway cannot deliver to an email address".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", destination),
                ("From", self.config.from.as_str()),
                ("Body", message),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, &body);
            error!(
                provider = %self.name,
                destination = %mask_identifier(destination),
                status = status.as_u16(),
                error = %err,
                "Gateway refused message"
            );
            return Err(err);
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(format!("unreadable gateway response: {}", e)))?;

        info!(
            provider = %self.name,
            destination = %mask_identifier(destination),
            message_id = %parsed.sid,
            "Message sent through gateway"
        );

        Ok(DeliveryReceipt {
            message_id: parsed.sid,
            provider: self.name.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
