//! Configuration for the verification service

use chrono::Duration;
use og_shared::config::{DeliveryConfig, OtpConfig};

use crate::errors::{DomainError, DomainResult};
use crate::services::codes::MAX_CODE_LENGTH;

const DEFAULT_CREDENTIAL_TIMEOUT_MS: u64 = 10_000;

/// Retry envelope around a single delivery
#[derive(Debug, Clone)]
pub struct DeliveryRetryConfig {
    /// Send attempts before giving up
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure
    pub initial_backoff_ms: u64,
    /// Upper bound of the delay between attempts
    pub max_backoff_ms: u64,
    /// Hard limit of one send attempt
    pub send_timeout_ms: u64,
}

impl Default for DeliveryRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            send_timeout_ms: 5_000,
        }
    }
}

impl DeliveryRetryConfig {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> std::time::Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let millis = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        std::time::Duration::from_millis(millis)
    }

    pub fn send_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.send_timeout_ms)
    }
}

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Digits per code
    pub code_length: usize,
    /// Session lifetime from creation
    pub session_ttl_seconds: i64,
    /// Failed verifications allowed
    pub max_attempts: u32,
    /// Total sends allowed per session, including the first
    pub max_resends: u32,
    /// Minimum seconds between two sends
    pub resend_cooldown_seconds: i64,
    /// Lifetime of the reset request opened by a successful verify
    pub reset_window_seconds: i64,
    /// Random bytes per reset link token
    pub reset_token_bytes: usize,
    /// Message body; `{code}` and `{minutes}` are substituted
    pub message_template: String,
    /// Retry envelope around the delivery provider
    pub delivery: DeliveryRetryConfig,
    /// Hard limit of one credential update
    pub credential_timeout_ms: u64,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self::from_settings(&OtpConfig::default(), &DeliveryConfig::default())
    }
}

impl VerificationServiceConfig {
    /// Build from the loaded application settings
    pub fn from_settings(otp: &OtpConfig, delivery: &DeliveryConfig) -> Self {
        Self {
            code_length: otp.code_length,
            session_ttl_seconds: otp.session_ttl_seconds as i64,
            max_attempts: otp.max_attempts,
            max_resends: otp.max_resends,
            resend_cooldown_seconds: otp.resend_cooldown_seconds as i64,
            reset_window_seconds: otp.reset_window_seconds as i64,
            reset_token_bytes: otp.reset_token_bytes,
            message_template: delivery.message_template.clone(),
            delivery: DeliveryRetryConfig {
                max_attempts: delivery.max_attempts.max(1),
                initial_backoff_ms: delivery.backoff_ms,
                send_timeout_ms: delivery.send_timeout_ms,
                ..Default::default()
            },
            credential_timeout_ms: DEFAULT_CREDENTIAL_TIMEOUT_MS,
        }
    }

    /// Override the credential update limit
    pub fn with_credential_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.credential_timeout_ms = timeout_ms;
        self
    }

    pub fn credential_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.credential_timeout_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::seconds(self.resend_cooldown_seconds)
    }

    pub fn reset_window(&self) -> Duration {
        Duration::seconds(self.reset_window_seconds)
    }

    /// Render the delivery message for a code
    pub fn render_message(&self, code: &str) -> String {
        let minutes = (self.session_ttl_seconds.max(0) + 59) / 60;
        self.message_template
            .replace("{code}", code)
            .replace("{minutes}", &minutes.to_string())
    }

    /// Reject settings the service cannot honour
    pub fn validate(&self) -> DomainResult<()> {
        let problem = if self.code_length == 0 || self.code_length > MAX_CODE_LENGTH {
            Some(format!("code_length must be between 1 and {}", MAX_CODE_LENGTH))
        } else if self.session_ttl_seconds <= 0 {
            Some("session_ttl_seconds must be positive".to_string())
        } else if self.max_attempts == 0 {
            Some("max_attempts must be at least 1".to_string())
        } else if self.max_resends == 0 {
            Some("max_resends must be at least 1".to_string())
        } else if self.resend_cooldown_seconds < 0 || self.reset_window_seconds <= 0 {
            Some("cooldown must not be negative and reset window must be positive".to_string())
        } else if self.reset_token_bytes == 0 {
            Some("reset_token_bytes must be at least 1".to_string())
        } else if self.credential_timeout_ms == 0 {
            Some("credential update timeout must be positive".to_string())
        } else {
            None
        };

        match problem {
            Some(message) => Err(DomainError::Validation { message }),
            None => Ok(()),
        }
    }

    /// Whether `code` has the shape of a code this service issues
    pub fn is_well_formed(&self, code: &str) -> bool {
        code.len() == self.code_length && code.chars().all(|c| c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = DeliveryRetryConfig::default();
        assert_eq!(config.backoff_for(1).as_millis(), 200);
        assert_eq!(config.backoff_for(2).as_millis(), 400);
        assert_eq!(config.backoff_for(3).as_millis(), 800);
        assert_eq!(config.backoff_for(10).as_millis(), 5_000);
        assert_eq!(config.backoff_for(200).as_millis(), 5_000);
    }

    #[test]
    fn test_render_message() {
        let config = VerificationServiceConfig::default();
        assert_eq!(
            config.render_message("042917"),
            "Your verification code is 042917. It expires in 10 minutes."
        );
    }

    #[test]
    fn test_validate() {
        assert!(VerificationServiceConfig::default().validate().is_ok());

        let config = VerificationServiceConfig {
            code_length: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = VerificationServiceConfig {
            max_resends: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = VerificationServiceConfig::default().with_credential_timeout_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credential_timeout() {
        let config = VerificationServiceConfig::default();
        assert_eq!(config.credential_timeout().as_millis(), 10_000);

        let config = config.with_credential_timeout_ms(250);
        assert_eq!(config.credential_timeout().as_millis(), 250);
    }

    #[test]
    fn test_is_well_formed() {
        let config = VerificationServiceConfig::default();
        assert!(config.is_well_formed("123456"));
        assert!(!config.is_well_formed("123"));
        assert!(!config.is_well_formed("12345a"));
        assert!(!config.is_well_formed("１２３４５６"));
    }
}
