//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `otp` - Code length, session lifetime, attempt and resend budgets
//! - `delivery` - Delivery provider selection, retry and timeout settings
//! - `cache` - Session store backend and Redis configuration
//! - `credentials` - Credential update backend
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server configuration

pub mod cache;
pub mod credentials;
pub mod delivery;
pub mod environment;
pub mod otp;
pub mod server;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use cache::{CacheConfig, StoreBackend, StoreConfig};
pub use credentials::{CredentialBackend, CredentialConfig};
pub use delivery::{DeliveryConfig, DeliveryProviderKind, GatewayConfig};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::OtpConfig;
pub use server::ServerConfig;

/// Prefix for environment variable overrides (`OTPGATE__OTP__MAX_RESENDS=5`)
pub const ENV_PREFIX: &str = "OTPGATE";

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// One-time code policy
    pub otp: OtpConfig,

    /// Delivery provider configuration
    pub delivery: DeliveryConfig,

    /// Session store configuration
    pub store: StoreConfig,

    /// Credential update configuration
    pub credentials: CredentialConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            otp: OtpConfig::default(),
            delivery: DeliveryConfig::default(),
            store: StoreConfig::default(),
            credentials: CredentialConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            logging: LoggingConfig::for_environment(Environment::Development),
            ..Default::default()
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            delivery: DeliveryConfig {
                provider: DeliveryProviderKind::Gateway,
                ..Default::default()
            },
            store: StoreConfig {
                backend: StoreBackend::Redis,
                ..Default::default()
            },
            credentials: CredentialConfig {
                backend: CredentialBackend::MySql,
                ..Default::default()
            },
            logging: LoggingConfig::for_environment(Environment::Production),
            ..Default::default()
        }
    }

    /// Load configuration for the current environment
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `.env` file (if present) loaded into the process environment
    /// 2. Built-in defaults for the detected environment
    /// 3. Optional `config/<environment file>` (TOML)
    /// 4. `OTPGATE__*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let defaults = match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
            Environment::Staging => Self {
                environment: Environment::Staging,
                logging: LoggingConfig::for_environment(Environment::Staging),
                ..Self::development()
            },
        };

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(
                config::File::with_name(&format!("config/{}", environment.config_file()))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
