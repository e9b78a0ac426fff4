//! Capabilities the verification service depends on
//!
//! Implementations live in the infrastructure layer and are chosen once at
//! process construction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::OtpSession;
use crate::errors::DomainResult;

/// Acknowledgement from a delivery transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider's message id
    pub message_id: String,
    /// Name of the provider that accepted the message
    pub provider: String,
}

/// Failure reported by a delivery transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by provider: {0}")]
    Rejected(String),

    #[error("Delivery timed out")]
    Timeout,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl DeliveryError {
    /// Whether another attempt may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, DeliveryError::Transport(_) | DeliveryError::Timeout)
    }
}

/// Sends a rendered message to a phone number or email address
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// Hand one message to the transport
    async fn send(&self, destination: &str, message: &str) -> Result<DeliveryReceipt, DeliveryError>;

    /// Provider name for logs and receipts
    fn provider_name(&self) -> &str;
}

/// Keyed storage of sessions
///
/// At most one session is indexed per identifier. `insert` replaces the
/// previous one only if the index still points where the caller last saw it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by id
    async fn get(&self, session_id: &Uuid) -> DomainResult<Option<OtpSession>>;

    /// Look up the current session of an identifier
    async fn find_by_identifier(&self, identifier: &str) -> DomainResult<Option<OtpSession>>;

    /// Store a new session, replacing the identifier's previous one
    ///
    /// `replaces` is the session the caller found for the identifier, or
    /// `None` if it found none. An index entry whose session is gone counts
    /// as none. Returns `false` without writing when the identifier now
    /// points elsewhere.
    async fn insert(&self, session: &OtpSession, replaces: Option<&Uuid>) -> DomainResult<bool>;

    /// Write `session` if the stored record still has `expected_version`
    ///
    /// Returns `false` without writing when the record changed or is gone.
    async fn update(&self, session: &OtpSession, expected_version: u64) -> DomainResult<bool>;

    /// Remove a session and its identifier index
    async fn delete(&self, session_id: &Uuid) -> DomainResult<()>;

    /// Evict every session past its retention deadline; returns the count
    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize>;
}

/// Applies a new credential for an identifier
#[async_trait]
pub trait CredentialUpdater: Send + Sync {
    async fn update_credential(&self, identifier: &str, new_credential: &str) -> DomainResult<()>;
}
