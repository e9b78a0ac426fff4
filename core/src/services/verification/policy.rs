//! Resend cooldown and budget enforcement

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::OtpSession;
use crate::errors::OtpError;

/// Why a send was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    CooldownActive { retry_after_seconds: u64 },
    MaxResendsReached { max_resends: u32 },
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDecision {
    Allow,
    Deny(DenyReason),
}

impl From<DenyReason> for OtpError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::CooldownActive { retry_after_seconds } => {
                OtpError::CooldownActive { retry_after_seconds }
            }
            DenyReason::MaxResendsReached { max_resends } => OtpError::MaxResendsReached { max_resends },
        }
    }
}

/// Decides whether another code may be sent for a session
///
/// The policy is a pure function of the session and the current time. The
/// caller records the send only after the transport accepted it.
#[derive(Debug, Clone)]
pub struct ResendPolicy {
    max_resends: u32,
    cooldown: Duration,
}

impl ResendPolicy {
    pub fn new(max_resends: u32, cooldown: Duration) -> Self {
        Self { max_resends, cooldown }
    }

    pub fn max_resends(&self) -> u32 {
        self.max_resends
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check a send for `session` at `now`
    ///
    /// An exhausted budget is reported before an active cooldown.
    pub fn evaluate(&self, session: Option<&OtpSession>, now: DateTime<Utc>) -> ResendDecision {
        let Some(session) = session else {
            return ResendDecision::Allow;
        };

        if session.resend_count >= self.max_resends {
            return ResendDecision::Deny(DenyReason::MaxResendsReached {
                max_resends: self.max_resends,
            });
        }

        if now < session.resend_available_at {
            return ResendDecision::Deny(DenyReason::CooldownActive {
                retry_after_seconds: session.seconds_until_resend(now).max(1),
            });
        }

        ResendDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>, resend_count: u32) -> OtpSession {
        let mut session = OtpSession::new(
            "+97612345678".into(),
            "digest".into(),
            now,
            Duration::minutes(10),
            5,
            Duration::seconds(60),
        );
        session.resend_count = resend_count;
        session
    }

    #[test]
    fn test_no_session_is_allowed() {
        let policy = ResendPolicy::new(3, Duration::seconds(60));
        assert_eq!(policy.evaluate(None, Utc::now()), ResendDecision::Allow);
    }

    #[test]
    fn test_cooldown_reports_remaining_seconds() {
        let now = Utc::now();
        let policy = ResendPolicy::new(3, Duration::seconds(60));
        let session = session(now, 1);

        assert_eq!(
            policy.evaluate(Some(&session), now + Duration::seconds(15)),
            ResendDecision::Deny(DenyReason::CooldownActive { retry_after_seconds: 45 })
        );
        assert_eq!(
            policy.evaluate(Some(&session), now + Duration::milliseconds(59_900)),
            ResendDecision::Deny(DenyReason::CooldownActive { retry_after_seconds: 1 })
        );
        assert_eq!(
            policy.evaluate(Some(&session), now + Duration::seconds(60)),
            ResendDecision::Allow
        );
    }

    #[test]
    fn test_budget_checked_before_cooldown() {
        let now = Utc::now();
        let policy = ResendPolicy::new(3, Duration::seconds(60));
        let session = session(now, 3);

        // Inside the cooldown
        assert_eq!(
            policy.evaluate(Some(&session), now),
            ResendDecision::Deny(DenyReason::MaxResendsReached { max_resends: 3 })
        );
        // Long after it
        assert_eq!(
            policy.evaluate(Some(&session), now + Duration::hours(1)),
            ResendDecision::Deny(DenyReason::MaxResendsReached { max_resends: 3 })
        );
    }

    #[test]
    fn test_deny_reason_maps_to_otp_error() {
        let err: OtpError = DenyReason::CooldownActive { retry_after_seconds: 7 }.into();
        assert_eq!(err, OtpError::CooldownActive { retry_after_seconds: 7 });
    }
}
