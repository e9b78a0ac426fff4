//! Business services containing domain logic and use cases.

pub mod codes;
pub mod verification;

// Re-export commonly used types
pub use verification::{
    CredentialUpdater, DeliveryError, DeliveryProvider, DeliveryReceipt, SessionStore,
    SessionSweeper, VerificationService, VerificationServiceConfig,
};
