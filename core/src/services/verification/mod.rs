//! Verification service module for one-time code flows
//!
//! This module provides the complete code workflow:
//! - Code issuance and delivery with bounded retry
//! - Resend cooldown and budget enforcement
//! - Verification with attempt tracking and lockout
//! - Single-use credential reset gated on a verified session
//! - Background eviction of expired sessions

mod config;
mod delivery;
mod locks;
mod policy;
mod service;
mod sweeper;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::{DeliveryRetryConfig, VerificationServiceConfig};
pub use delivery::deliver_with_retry;
pub use locks::{KeyedLockGuard, KeyedLocks};
pub use policy::{DenyReason, ResendDecision, ResendPolicy};
pub use service::VerificationService;
pub use sweeper::{SessionSweeper, SweepResult};
pub use traits::{CredentialUpdater, DeliveryError, DeliveryProvider, DeliveryReceipt, SessionStore};
pub use types::{
    ConsumeResult, RequestCodeResult, ResendCodeResult, ResetTokenIssued, SessionSnapshot,
    VerifyCodeResult,
};
