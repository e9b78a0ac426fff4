//! Delivery provider configuration

use serde::{Deserialize, Serialize};

/// Which delivery provider the process is wired with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryProviderKind {
    /// Log the masked destination only; nothing leaves the process
    Log,
    /// HTTP messaging gateway
    Gateway,
    /// Primary gateway with a backup gateway
    Failover,
}

/// Messaging gateway credentials and endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// API base URL, e.g. `https://api.twilio.com/2010-04-01`
    pub base_url: String,

    /// Account identifier (basic auth user)
    pub account_sid: String,

    /// Account secret (basic auth password)
    pub auth_token: String,

    /// Sender number or sender id
    pub from: String,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.twilio.com/2010-04-01"),
            account_sid: String::new(),
            auth_token: String::new(),
            from: String::new(),
            request_timeout_secs: 10,
        }
    }
}

impl GatewayConfig {
    /// Whether all credentials are present
    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty()
            && !self.account_sid.is_empty()
            && !self.auth_token.is_empty()
            && !self.from.is_empty()
    }
}

/// Delivery configuration: provider choice plus the orchestrator's retry envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Provider variant
    pub provider: DeliveryProviderKind,

    /// Primary gateway
    pub gateway: GatewayConfig,

    /// Backup gateway used by the failover provider
    pub backup_gateway: Option<GatewayConfig>,

    /// Seconds before a failed primary is tried again
    pub failover_recovery_seconds: u64,

    /// Send attempts before surfacing a delivery failure
    pub max_attempts: u32,

    /// Initial backoff between attempts in milliseconds (doubles per attempt)
    pub backoff_ms: u64,

    /// Hard timeout of a single send attempt in milliseconds
    pub send_timeout_ms: u64,

    /// Message template; `{code}` and `{minutes}` are substituted
    pub message_template: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            provider: DeliveryProviderKind::Log,
            gateway: GatewayConfig::default(),
            backup_gateway: None,
            failover_recovery_seconds: 30,
            max_attempts: 3,
            backoff_ms: 200,
            send_timeout_ms: 5_000,
            message_template: String::from(
                "Your verification code is {code}. It expires in {minutes} minutes.",
            ),
        }
    }
}
