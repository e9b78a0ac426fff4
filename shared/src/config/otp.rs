//! One-time code policy configuration

use serde::{Deserialize, Serialize};

/// Policy constants for code issuance and verification
///
/// These are process-wide; they are never negotiated per call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Number of digits in a generated code
    pub code_length: usize,

    /// Session lifetime in seconds, fixed at creation
    pub session_ttl_seconds: u64,

    /// Failed verifications allowed before the session locks
    pub max_attempts: u32,

    /// Total sends allowed per session, including the first
    pub max_resends: u32,

    /// Minimum seconds between two sends for one session
    pub resend_cooldown_seconds: u64,

    /// Seconds a verified session may be used to reset a credential
    pub reset_window_seconds: u64,

    /// Random bytes in a reset link token
    pub reset_token_bytes: usize,

    /// Interval of the expired-session sweep (0 disables it)
    pub sweep_interval_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            session_ttl_seconds: 600,
            max_attempts: 5,
            max_resends: 3,
            resend_cooldown_seconds: 60,
            reset_window_seconds: 900,
            reset_token_bytes: 32,
            sweep_interval_seconds: 60,
        }
    }
}

impl OtpConfig {
    /// Session lifetime in whole minutes, rounded up, for message templates
    pub fn session_ttl_minutes(&self) -> u64 {
        (self.session_ttl_seconds + 59) / 60
    }

    /// Whether the background sweep should run
    pub fn sweep_enabled(&self) -> bool {
        self.sweep_interval_seconds > 0
    }
}
