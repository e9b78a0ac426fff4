//! Periodic eviction of sessions past their retention deadline
//!
//! Expiry itself is detected lazily on access; the sweeper only bounds how
//! long dead records occupy the store.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainResult;

use super::traits::SessionStore;

/// Service that purges expired sessions from a store
pub struct SessionSweeper<S: SessionStore + ?Sized + 'static> {
    store: Arc<S>,
    interval_seconds: u64,
}

/// Result of one sweep
#[derive(Debug, Clone)]
pub struct SweepResult {
    /// Sessions removed
    pub sessions_purged: usize,
    /// When the sweep ran
    pub ran_at: DateTime<Utc>,
}

impl<S: SessionStore + ?Sized + 'static> SessionSweeper<S> {
    /// Create a sweeper; an interval of 0 disables the background task
    pub fn new(store: Arc<S>, interval_seconds: u64) -> Self {
        Self {
            store,
            interval_seconds,
        }
    }

    /// Run a single sweep
    pub async fn run_sweep(&self) -> DomainResult<SweepResult> {
        let now = Utc::now();
        let sessions_purged = self.store.purge_expired(now).await?;

        if sessions_purged > 0 {
            info!(
                sessions_purged = sessions_purged,
                event = "sessions_swept",
                "Purged expired sessions"
            );
        }

        Ok(SweepResult {
            sessions_purged,
            ran_at: now,
        })
    }

    /// Start the sweeper as a background task
    ///
    /// Returns `None` when the sweeper is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.interval_seconds == 0 {
            warn!("Session sweeper is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                "Session sweeper started - will run every {} seconds",
                self.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_sweep().await {
                    error!("Session sweep failed: {}", e);
                }
            }
        }))
    }
}
