//! Main verification service implementation

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::otp_session::seconds_until;
use crate::domain::entities::{OtpSession, ResetRequest, SessionStatus};
use crate::domain::value_objects::Identifier;
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::services::codes::{constant_time_equals, digest, generate_numeric_code, generate_opaque_token};

use super::config::VerificationServiceConfig;
use super::delivery::deliver_with_retry;
use super::locks::{KeyedLockGuard, KeyedLocks};
use super::policy::{ResendDecision, ResendPolicy};
use super::traits::{CredentialUpdater, DeliveryProvider, SessionStore};
use super::types::{
    ConsumeResult, RequestCodeResult, ResendCodeResult, ResetTokenIssued, SessionSnapshot,
    VerifyCodeResult,
};

/// Orchestrates request, resend, verify and consume for one-time code sessions
///
/// Every transition of an identifier runs under that identifier's lock, from
/// the authoritative read to the final write. Writes are compare-and-swap on
/// the session version so a second process sharing the store cannot be
/// silently overwritten.
pub struct VerificationService<D, S, U>
where
    D: DeliveryProvider + ?Sized,
    S: SessionStore + ?Sized,
    U: CredentialUpdater + ?Sized,
{
    /// Transport for codes
    delivery: Arc<D>,
    /// Session storage
    store: Arc<S>,
    /// Applies new credentials
    credentials: Arc<U>,
    /// Service configuration
    config: VerificationServiceConfig,
    /// Resend cooldown and budget
    policy: ResendPolicy,
    /// Per-identifier serialization
    locks: KeyedLocks,
}

impl<D, S, U> VerificationService<D, S, U>
where
    D: DeliveryProvider + ?Sized,
    S: SessionStore + ?Sized + 'static,
    U: CredentialUpdater + ?Sized + 'static,
{
    /// Create a new verification service
    ///
    /// # Arguments
    ///
    /// * `delivery` - Delivery provider chosen at start-up
    /// * `store` - Session store
    /// * `credentials` - Credential updater used by the reset operations
    /// * `config` - Service configuration
    pub fn new(
        delivery: Arc<D>,
        store: Arc<S>,
        credentials: Arc<U>,
        config: VerificationServiceConfig,
    ) -> Self {
        let policy = ResendPolicy::new(config.max_resends, config.resend_cooldown());
        Self {
            delivery,
            store,
            credentials,
            config,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &VerificationServiceConfig {
        &self.config
    }

    /// Issue a code for an identifier
    ///
    /// If the identifier already has an active pending session this is a
    /// resend of that session and the resend policy applies. Otherwise a new
    /// session replaces whatever the identifier had before.
    ///
    /// # Returns
    ///
    /// * `Ok(RequestCodeResult)` - Session handle and cooldown
    /// * `Err(DomainError)` - `InvalidIdentifier`, `CooldownActive`,
    ///   `MaxResendsReached`, `DeliveryFailure`, `Conflict` when another
    ///   process issued a session for the identifier meanwhile, or a fatal error
    pub async fn request_code(&self, identifier: &str) -> DomainResult<RequestCodeResult> {
        let identifier = Identifier::parse(identifier).map_err(|e| {
            tracing::warn!(event = "invalid_identifier", "Code requested for an invalid identifier");
            e
        })?;

        let _guard = self.locks.lock(identifier.as_str()).await;
        let now = Utc::now();

        let existing = self.store.find_by_identifier(identifier.as_str()).await?;
        let replaces = existing.as_ref().map(|s| s.id);
        if let Some(existing) = existing {
            if existing.is_active_at(now) {
                let session_id = existing.id;
                let expires_at = existing.expires_at;
                let resent = self.resend_locked(existing).await?;
                return Ok(RequestCodeResult {
                    session_id,
                    cooldown_seconds: resent.cooldown_seconds,
                    expires_at,
                });
            }

            tracing::debug!(
                identifier = %identifier,
                session_id = %existing.id,
                status = ?existing.status,
                event = "session_replaced",
                "Replacing inactive session"
            );
        }

        let code = generate_numeric_code(self.config.code_length)?;
        let message = self.config.render_message(&code);
        let receipt = deliver_with_retry(
            self.delivery.as_ref(),
            identifier.as_str(),
            &message,
            &self.config.delivery,
        )
        .await?;

        let session = OtpSession::new(
            identifier.as_str().to_string(),
            digest(&code),
            Utc::now(),
            self.config.session_ttl(),
            self.config.max_attempts,
            self.config.resend_cooldown(),
        );
        if !self.store.insert(&session, replaces.as_ref()).await? {
            tracing::error!(
                identifier = %identifier,
                session_id = %session.id,
                event = "session_conflict",
                "Identifier was given a session by another writer"
            );
            return Err(DomainError::Conflict {
                session_id: session.id.to_string(),
            });
        }

        tracing::info!(
            identifier = %identifier,
            session_id = %session.id,
            provider = %receipt.provider,
            event = "otp_generated",
            "Issued new verification code"
        );

        Ok(RequestCodeResult {
            session_id: session.id,
            cooldown_seconds: self.config.resend_cooldown_seconds.max(0) as u64,
            expires_at: session.expires_at,
        })
    }

    /// Send a fresh code for an existing session
    ///
    /// The previous code stops being valid as soon as the new one is stored.
    /// A failed delivery leaves the session, including its resend budget,
    /// untouched.
    pub async fn resend_code(&self, session_id: &Uuid) -> DomainResult<ResendCodeResult> {
        let (_guard, session) = self.load_locked(session_id).await?;
        self.resend_locked(session).await
    }

    /// Check a code against a session
    ///
    /// A malformed code is rejected before the session is looked up and costs
    /// no attempt. A wrong code costs one; the last one locks the session.
    pub async fn verify_code(&self, session_id: &Uuid, code: &str) -> DomainResult<VerifyCodeResult> {
        if !self.config.is_well_formed(code) {
            tracing::warn!(
                session_id = %session_id,
                code_length = code.len(),
                event = "invalid_code_format",
                "Malformed verification code"
            );
            return Err(OtpError::MalformedCode {
                expected_length: self.config.code_length,
            }
            .into());
        }

        let (_guard, mut session) = self.load_locked(session_id).await?;
        let now = Utc::now();
        self.apply_expiry(&mut session, now).await;

        match session.status {
            SessionStatus::Pending => {}
            SessionStatus::Expired => return Err(OtpError::ExpiredSession.into()),
            SessionStatus::Locked => return Err(OtpError::MaxAttemptsExceeded.into()),
            SessionStatus::Verified => return Err(OtpError::AlreadyConsumed.into()),
        }

        let submitted = digest(code);
        let matches = session
            .code_digest
            .as_deref()
            .map(|stored| constant_time_equals(stored, &submitted))
            .unwrap_or(false);

        if matches {
            session.mark_verified(now, self.config.reset_window());
            self.persist(&mut session).await?;

            tracing::info!(
                identifier = %masked(&session),
                session_id = %session.id,
                event = "otp_verified",
                "Verification code accepted"
            );
            return Ok(VerifyCodeResult { verified: true });
        }

        let attempts_remaining = session.record_failed_attempt();
        self.persist(&mut session).await?;

        if attempts_remaining == 0 {
            tracing::warn!(
                identifier = %masked(&session),
                session_id = %session.id,
                event = "otp_locked",
                "Session locked after too many failed attempts"
            );
            return Err(OtpError::MaxAttemptsExceeded.into());
        }

        tracing::warn!(
            identifier = %masked(&session),
            session_id = %session.id,
            attempts_remaining = attempts_remaining,
            event = "otp_verification_failed",
            "Verification code rejected"
        );
        Err(OtpError::InvalidCode { attempts_remaining }.into())
    }

    /// Apply a new credential using a verified session
    ///
    /// Succeeds once per verified session. The session is deleted afterwards.
    /// Once the request is claimed the rest runs in its own task, so a caller
    /// that goes away cannot leave the request claimed but unapplied.
    pub async fn consume_for_reset(
        &self,
        session_id: &Uuid,
        new_credential: &str,
    ) -> DomainResult<ConsumeResult> {
        self.consume(session_id, None, new_credential).await
    }

    /// Like `consume_for_reset`, additionally requiring the reset link token
    pub async fn consume_with_token(
        &self,
        session_id: &Uuid,
        token: &str,
        new_credential: &str,
    ) -> DomainResult<ConsumeResult> {
        self.consume(session_id, Some(token), new_credential).await
    }

    /// Mint a reset link token for a verified session
    ///
    /// Only the digest is stored. Issuing again replaces the previous token.
    pub async fn issue_reset_token(&self, session_id: &Uuid) -> DomainResult<ResetTokenIssued> {
        let (_guard, mut session) = self.load_locked(session_id).await?;
        let now = Utc::now();
        self.apply_expiry(&mut session, now).await;

        let expires_at = open_reset_request(&session, now)?.expires_at;
        let token = generate_opaque_token(self.config.reset_token_bytes)?;

        if let Some(reset) = session.reset_request.as_mut() {
            reset.token_digest = Some(digest(&token));
        }
        self.persist(&mut session).await?;

        tracing::info!(
            identifier = %masked(&session),
            session_id = %session.id,
            event = "reset_token_issued",
            "Issued reset token"
        );

        Ok(ResetTokenIssued { token, expires_at })
    }

    /// Current state of a session, after applying lazy expiry
    pub async fn session_status(&self, session_id: &Uuid) -> DomainResult<SessionSnapshot> {
        let (_guard, mut session) = self.load_locked(session_id).await?;
        let now = Utc::now();
        self.apply_expiry(&mut session, now).await;

        let resend_available_in_seconds = match session.status {
            SessionStatus::Pending => session.seconds_until_resend(now),
            _ => 0,
        };

        Ok(SessionSnapshot {
            session_id: session.id,
            status: session.status,
            attempts_remaining: session.attempts_remaining,
            resends_remaining: session.resends_remaining(self.config.max_resends),
            resend_available_in_seconds,
            expires_in_seconds: seconds_until(session.effective_deadline(), now),
        })
    }

    async fn consume(
        &self,
        session_id: &Uuid,
        token: Option<&str>,
        new_credential: &str,
    ) -> DomainResult<ConsumeResult> {
        if new_credential.is_empty() {
            return Err(DomainError::Validation {
                message: "new credential must not be empty".to_string(),
            });
        }

        let (guard, mut session) = self.load_locked(session_id).await?;
        let now = Utc::now();
        self.apply_expiry(&mut session, now).await;

        let reset = open_reset_request(&session, now)?;

        if let Some(token) = token {
            let submitted = digest(token);
            let valid = reset
                .token_digest
                .as_deref()
                .map(|stored| constant_time_equals(stored, &submitted))
                .unwrap_or(false);
            if !valid {
                tracing::warn!(
                    identifier = %masked(&session),
                    session_id = %session.id,
                    event = "reset_token_rejected",
                    "Reset token did not match"
                );
                return Err(OtpError::InvalidResetToken.into());
            }
        }

        let task = tokio::spawn(settle_reset(
            Arc::clone(&self.store),
            Arc::clone(&self.credentials),
            session,
            new_credential.to_string(),
            self.config.credential_timeout(),
            guard,
        ));

        task.await.map_err(|e| DomainError::Internal {
            message: format!("reset task failed: {}", e),
        })?
    }

    /// Resend for a session whose identifier lock is already held
    async fn resend_locked(&self, mut session: OtpSession) -> DomainResult<ResendCodeResult> {
        let now = Utc::now();
        self.apply_expiry(&mut session, now).await;

        match session.status {
            SessionStatus::Pending => {}
            SessionStatus::Expired => return Err(OtpError::ExpiredSession.into()),
            SessionStatus::Locked => return Err(OtpError::MaxAttemptsExceeded.into()),
            SessionStatus::Verified => return Err(OtpError::AlreadyConsumed.into()),
        }

        if let ResendDecision::Deny(reason) = self.policy.evaluate(Some(&session), now) {
            tracing::warn!(
                identifier = %masked(&session),
                session_id = %session.id,
                reason = ?reason,
                event = "resend_denied",
                "Resend denied by policy"
            );
            return Err(OtpError::from(reason).into());
        }

        let code = generate_numeric_code(self.config.code_length)?;
        let message = self.config.render_message(&code);
        deliver_with_retry(
            self.delivery.as_ref(),
            &session.identifier,
            &message,
            &self.config.delivery,
        )
        .await?;

        session.record_send(digest(&code), Utc::now(), self.policy.cooldown());
        self.persist(&mut session).await?;

        tracing::info!(
            identifier = %masked(&session),
            session_id = %session.id,
            resend_count = session.resend_count,
            event = "otp_resent",
            "Resent verification code"
        );

        Ok(ResendCodeResult {
            cooldown_seconds: self.config.resend_cooldown_seconds.max(0) as u64,
            resends_remaining: session.resends_remaining(self.policy.max_resends()),
        })
    }

    /// Take the session's identifier lock, then read the session again
    async fn load_locked(&self, session_id: &Uuid) -> DomainResult<(KeyedLockGuard, OtpSession)> {
        let probe = self
            .store
            .get(session_id)
            .await?
            .ok_or(OtpError::SessionNotFound)?;

        let guard = self.locks.lock(&probe.identifier).await;

        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or(OtpError::SessionNotFound)?;

        Ok((guard, session))
    }

    /// Persist a lazily detected expiry. The outcome is reported by the caller.
    async fn apply_expiry(&self, session: &mut OtpSession, now: DateTime<Utc>) {
        if session.expire_if_due(now) {
            tracing::info!(
                identifier = %masked(session),
                session_id = %session.id,
                event = "otp_expired",
                "Session expired"
            );
            if let Err(e) = self.persist(session).await {
                tracing::warn!(
                    session_id = %session.id,
                    error = %e,
                    event = "expiry_persist_failed",
                    "Failed to persist session expiry"
                );
            }
        }
    }

    async fn persist(&self, session: &mut OtpSession) -> DomainResult<()> {
        persist_session(self.store.as_ref(), session).await
    }
}

/// Compare-and-swap write of a mutated session
async fn persist_session<S>(store: &S, session: &mut OtpSession) -> DomainResult<()>
where
    S: SessionStore + ?Sized,
{
    let expected = session.advance_version();
    if store.update(session, expected).await? {
        return Ok(());
    }

    tracing::error!(
        session_id = %session.id,
        expected_version = expected,
        event = "session_conflict",
        "Session changed concurrently"
    );
    Err(DomainError::Conflict {
        session_id: session.id.to_string(),
    })
}

/// Claim the reset request, apply the credential, then delete the session
///
/// A failed or timed out update releases the claim. The identifier lock is
/// held until this returns.
async fn settle_reset<S, U>(
    store: Arc<S>,
    credentials: Arc<U>,
    mut session: OtpSession,
    new_credential: String,
    update_timeout: std::time::Duration,
    _guard: KeyedLockGuard,
) -> DomainResult<ConsumeResult>
where
    S: SessionStore + ?Sized,
    U: CredentialUpdater + ?Sized,
{
    // Claim before touching the credential so a second process sharing the
    // store cannot consume it as well
    claim(&mut session)?;
    persist_session(store.as_ref(), &mut session).await?;

    let update = credentials.update_credential(&session.identifier, &new_credential);
    let outcome = match tokio::time::timeout(update_timeout, update).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::Credential {
            message: format!("update timed out after {} ms", update_timeout.as_millis()),
        }),
    };

    if let Err(e) = outcome {
        tracing::error!(
            identifier = %masked(&session),
            session_id = %session.id,
            error = %e,
            event = "credential_update_failed",
            "Credential update failed, releasing reset request"
        );
        if let Some(reset) = session.reset_request.as_mut() {
            reset.release();
        }
        if let Err(release_err) = persist_session(store.as_ref(), &mut session).await {
            tracing::error!(
                session_id = %session.id,
                error = %release_err,
                event = "reset_release_failed",
                "Failed to release reset request"
            );
        }
        return Err(e);
    }

    store.delete(&session.id).await?;

    tracing::info!(
        identifier = %masked(&session),
        session_id = %session.id,
        event = "credential_reset",
        "Credential updated and session consumed"
    );

    Ok(ConsumeResult { success: true })
}

/// The reset request of a session that may still be consumed
fn open_reset_request(session: &OtpSession, now: DateTime<Utc>) -> Result<&ResetRequest, OtpError> {
    let reset = match (session.status, session.reset_request.as_ref()) {
        (SessionStatus::Verified, Some(reset)) => reset,
        _ => return Err(OtpError::NotVerified),
    };

    if reset.used {
        return Err(OtpError::AlreadyConsumed);
    }
    if reset.is_expired_at(now) {
        return Err(OtpError::ExpiredSession);
    }
    Ok(reset)
}

fn claim(session: &mut OtpSession) -> Result<(), OtpError> {
    match session.reset_request.as_mut() {
        Some(reset) => {
            if reset.mark_used() {
                Ok(())
            } else {
                Err(OtpError::AlreadyConsumed)
            }
        }
        None => Err(OtpError::NotVerified),
    }
}

fn masked(session: &OtpSession) -> String {
    og_shared::utils::identifier::mask_identifier(&session.identifier)
}
