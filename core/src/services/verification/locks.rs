//! Per-identifier serialization of session transitions

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// Registry of async locks keyed by identifier
///
/// Entries exist only while a lock is held or awaited, so the registry stays
/// bounded by the number of identifiers currently in flight.
#[derive(Debug, Default, Clone)]
pub struct KeyedLocks {
    entries: Arc<StdMutex<LockMap>>,
}

/// Held lock for one key; released on drop
pub struct KeyedLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    entries: Arc<StdMutex<LockMap>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `key`
    ///
    /// Dropping the returned future while it waits unregisters the key like
    /// releasing a held lock does.
    pub async fn lock(&self, key: &str) -> KeyedLockGuard {
        let mutex = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let mut held = KeyedLockGuard {
            guard: None,
            key: key.to_string(),
            entries: Arc::clone(&self.entries),
        };
        // Declared after `held`, so an abandoned wait drops it first
        let acquire = mutex.lock_owned();
        held.guard = Some(acquire.await);
        held
    }

    /// Number of keys currently locked or awaited
    pub fn active_keys(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for KeyedLockGuard {
    fn drop(&mut self) {
        // Release first so the strong count reflects only other waiters
        self.guard.take();

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mutex) = entries.get(&self.key) {
            if Arc::strong_count(mutex) == 1 {
                entries.remove(&self.key);
            }
        }
    }
}
