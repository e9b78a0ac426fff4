//! Reset request entity created when a session is verified.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Authorization to change the credential of one identifier, once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    /// Identifier whose credential may be changed
    pub identifier: String,

    /// SHA-256 digest of the reset link token, when one was issued
    pub token_digest: Option<String>,

    /// When the owning session was verified
    pub created_at: DateTime<Utc>,

    /// End of the reset window
    pub expires_at: DateTime<Utc>,

    /// Whether the credential change already happened
    pub used: bool,
}

impl ResetRequest {
    /// Open a reset window starting at `now`
    pub fn new(identifier: String, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            identifier,
            token_digest: None,
            created_at: now,
            expires_at: now + window,
            used: false,
        }
    }

    /// Whether the reset window has elapsed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Claim the request. Returns `false` if it was already used.
    pub fn mark_used(&mut self) -> bool {
        if self.used {
            return false;
        }
        self.used = true;
        true
    }

    /// Undo a claim whose credential change did not go through
    pub fn release(&mut self) {
        self.used = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_used_only_once() {
        let mut request = ResetRequest::new("+97612345678".into(), Utc::now(), Duration::minutes(15));
        assert!(request.mark_used());
        assert!(!request.mark_used());

        request.release();
        assert!(!request.used);
        assert!(request.mark_used());
    }

    #[test]
    fn test_window() {
        let now = Utc::now();
        let request = ResetRequest::new("a@example.com".into(), now, Duration::seconds(60));
        assert!(!request.is_expired_at(now + Duration::seconds(60)));
        assert!(request.is_expired_at(now + Duration::seconds(61)));
    }
}
