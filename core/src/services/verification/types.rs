//! Types for verification service results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::SessionStatus;

/// Result of requesting a code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCodeResult {
    /// Handle for the follow-up calls
    pub session_id: Uuid,
    /// Seconds until another code may be requested
    pub cooldown_seconds: u64,
    /// When the session stops accepting codes
    pub expires_at: DateTime<Utc>,
}

/// Result of a resend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendCodeResult {
    pub cooldown_seconds: u64,
    /// Sends left in the session budget
    pub resends_remaining: u32,
}

/// Result of a successful verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResult {
    pub verified: bool,
}

/// Result of a credential change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeResult {
    pub success: bool,
}

/// A reset link token; the plaintext is only ever returned here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetTokenIssued {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub attempts_remaining: u32,
    pub resends_remaining: u32,
    /// Seconds until a resend is allowed (0 when allowed now)
    pub resend_available_in_seconds: u64,
    /// Seconds until the governing deadline (code TTL, or reset window once verified)
    pub expires_in_seconds: u64,
}
