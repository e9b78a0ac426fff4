//! One-time code session entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reset_request::ResetRequest;

/// Seconds a session is retained past its last deadline so late callers are
/// told it expired instead of that it does not exist
pub const RETENTION_GRACE_SECONDS: i64 = 300;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// A code is outstanding
    Pending,
    /// The code was verified; a reset request is open
    Verified,
    /// Too many failed attempts; terminal
    Locked,
    /// The session outlived its TTL while pending; terminal
    Expired,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Locked | SessionStatus::Expired)
    }
}

/// One outstanding verification for one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSession {
    /// Opaque handle given to callers instead of the identifier
    pub id: Uuid,

    /// Normalized phone number (E.164) or email address
    pub identifier: String,

    /// SHA-256 digest of the current code; `None` once no code is valid
    pub code_digest: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Fixed at creation, never extended by resends
    pub expires_at: DateTime<Utc>,

    pub attempts_remaining: u32,

    /// Codes sent so far, including the first
    pub resend_count: u32,

    /// Earliest time another code may be sent
    pub resend_available_at: DateTime<Utc>,

    pub status: SessionStatus,

    /// Present once the session is verified
    pub reset_request: Option<ResetRequest>,

    /// Record version for compare-and-swap writes
    pub version: u64,
}

impl OtpSession {
    /// Create a pending session whose first code was just delivered
    ///
    /// # Arguments
    ///
    /// * `identifier` - Normalized destination
    /// * `code_digest` - Digest of the delivered code
    /// * `now` - Time the code was accepted by the transport
    /// * `ttl` - Session lifetime
    /// * `max_attempts` - Failed verifications allowed
    /// * `cooldown` - Minimum delay before the next send
    pub fn new(
        identifier: String,
        code_digest: String,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
        cooldown: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier,
            code_digest: Some(code_digest),
            created_at: now,
            expires_at: now + ttl,
            attempts_remaining: max_attempts,
            resend_count: 1,
            resend_available_at: now + cooldown,
            status: SessionStatus::Pending,
            reset_request: None,
            version: 0,
        }
    }

    /// Whether the session is pending and still inside its TTL
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Pending && now <= self.expires_at
    }

    /// Move a pending session past its TTL to `Expired`
    ///
    /// Returns `true` if the status changed.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::Pending && now > self.expires_at {
            self.status = SessionStatus::Expired;
            self.code_digest = None;
            return true;
        }
        false
    }

    /// Replace the code after a successful send and start a new cooldown
    pub fn record_send(&mut self, code_digest: String, now: DateTime<Utc>, cooldown: Duration) {
        self.code_digest = Some(code_digest);
        self.resend_count += 1;
        self.resend_available_at = now + cooldown;
    }

    /// Charge a failed verification. Locks the session when none remain.
    ///
    /// Returns the attempts left.
    pub fn record_failed_attempt(&mut self) -> u32 {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            self.status = SessionStatus::Locked;
            self.code_digest = None;
        }
        self.attempts_remaining
    }

    /// Mark the code verified and open the reset window
    pub fn mark_verified(&mut self, now: DateTime<Utc>, reset_window: Duration) {
        self.status = SessionStatus::Verified;
        self.code_digest = None;
        self.reset_request = Some(ResetRequest::new(self.identifier.clone(), now, reset_window));
    }

    /// Sends left under a budget of `max_resends`
    pub fn resends_remaining(&self, max_resends: u32) -> u32 {
        max_resends.saturating_sub(self.resend_count)
    }

    /// Whole seconds until another send is allowed, rounded up
    pub fn seconds_until_resend(&self, now: DateTime<Utc>) -> u64 {
        seconds_until(self.resend_available_at, now)
    }

    /// Deadline that currently governs the session
    pub fn effective_deadline(&self) -> DateTime<Utc> {
        match (&self.status, &self.reset_request) {
            (SessionStatus::Verified, Some(reset)) => reset.expires_at,
            _ => self.expires_at,
        }
    }

    /// Point after which a store may evict the record
    pub fn retention_deadline(&self) -> DateTime<Utc> {
        let last = match &self.reset_request {
            Some(reset) if reset.expires_at > self.expires_at => reset.expires_at,
            _ => self.expires_at,
        };
        last + Duration::seconds(RETENTION_GRACE_SECONDS)
    }

    /// Bump the version for a write and return the version the store must hold
    pub fn advance_version(&mut self) -> u64 {
        let expected = self.version;
        self.version += 1;
        expected
    }
}

/// Whole seconds from `now` until `deadline`, rounded up; zero once passed
pub(crate) fn seconds_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (deadline - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        ((millis + 999) / 1000) as u64
    }
}
