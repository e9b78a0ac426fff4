//! In-memory session store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use og_core::domain::entities::OtpSession;
use og_core::errors::DomainResult;
use og_core::services::verification::SessionStore;

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, OtpSession>,
    by_identifier: HashMap<String, Uuid>,
}

/// Session store backed by a process-local map
///
/// Records are not evicted on their own; run the session sweeper to bound
/// memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Inner>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &Uuid) -> DomainResult<Option<OtpSession>> {
        Ok(self.inner.read().await.sessions.get(session_id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> DomainResult<Option<OtpSession>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_identifier
            .get(identifier)
            .and_then(|id| inner.sessions.get(id))
            .cloned())
    }

    async fn insert(&self, session: &OtpSession, replaces: Option<&Uuid>) -> DomainResult<bool> {
        let mut inner = self.inner.write().await;
        let current = inner
            .by_identifier
            .get(&session.identifier)
            .copied()
            .filter(|id| inner.sessions.contains_key(id));
        if current.as_ref() != replaces {
            return Ok(false);
        }

        inner
            .by_identifier
            .insert(session.identifier.clone(), session.id);
        if let Some(previous) = current.filter(|id| *id != session.id) {
            inner.sessions.remove(&previous);
        }
        inner.sessions.insert(session.id, session.clone());
        Ok(true)
    }

    async fn update(&self, session: &OtpSession, expected_version: u64) -> DomainResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(&session.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = session.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, session_id: &Uuid) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        let removed = inner.sessions.remove(session_id);
        if let Some(session) = removed {
            if inner.by_identifier.get(&session.identifier) == Some(session_id) {
                inner.by_identifier.remove(&session.identifier);
            }
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, session| session.retention_deadline() >= now);
        let Inner { sessions, by_identifier } = &mut *inner;
        by_identifier.retain(|_, id| sessions.contains_key(id));
        Ok(before - sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(identifier: &str, created_at: DateTime<Utc>) -> OtpSession {
        OtpSession::new(
            identifier.to_string(),
            "digest".to_string(),
            created_at,
            Duration::minutes(10),
            5,
            Duration::seconds(60),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemorySessionStore::new();
        let s = session("+97612345678", Utc::now());
        assert!(store.insert(&s, None).await.unwrap());

        assert_eq!(store.get(&s.id).await.unwrap(), Some(s.clone()));
        assert_eq!(store.find_by_identifier("+97612345678").await.unwrap(), Some(s));
        assert_eq!(store.find_by_identifier("+14155552671").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_replaces_previous_session_of_identifier() {
        let store = InMemorySessionStore::new();
        let first = session("+97612345678", Utc::now());
        let second = session("+97612345678", Utc::now());
        assert!(store.insert(&first, None).await.unwrap());
        assert!(store.insert(&second, Some(&first.id)).await.unwrap());

        assert!(store.get(&first.id).await.unwrap().is_none());
        assert_eq!(store.find_by_identifier("+97612345678").await.unwrap().unwrap().id, second.id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_loses_when_identifier_moved_on() {
        let store = InMemorySessionStore::new();
        let first = session("+97612345678", Utc::now());
        assert!(store.insert(&first, None).await.unwrap());

        // Two writers both saw `first`; only one may replace it
        let winner = session("+97612345678", Utc::now());
        let loser = session("+97612345678", Utc::now());
        assert!(store.insert(&winner, Some(&first.id)).await.unwrap());
        assert!(!store.insert(&loser, Some(&first.id)).await.unwrap());

        // A writer that saw nothing loses as well
        let late = session("+97612345678", Utc::now());
        assert!(!store.insert(&late, None).await.unwrap());

        assert_eq!(store.find_by_identifier("+97612345678").await.unwrap().unwrap().id, winner.id);
        assert!(store.get(&loser.id).await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_over_purged_session() {
        let store = InMemorySessionStore::new();
        let dead = session("+97612345678", Utc::now() - Duration::hours(1));
        assert!(store.insert(&dead, None).await.unwrap());
        store.purge_expired(Utc::now()).await.unwrap();

        // The caller saw nothing, and nothing is what remains
        let fresh = session("+97612345678", Utc::now());
        assert!(store.insert(&fresh, None).await.unwrap());
        assert_eq!(store.find_by_identifier("+97612345678").await.unwrap().unwrap().id, fresh.id);
    }

    #[tokio::test]
    async fn test_update_is_compare_and_swap() {
        let store = InMemorySessionStore::new();
        let mut s = session("+97612345678", Utc::now());
        assert!(store.insert(&s, None).await.unwrap());

        let expected = s.advance_version();
        s.attempts_remaining = 4;
        assert!(store.update(&s, expected).await.unwrap());

        // A writer holding the old version loses
        let mut stale = s.clone();
        stale.version = 1;
        assert!(!store.update(&stale, 0).await.unwrap());

        let stored = store.get(&s.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.attempts_remaining, 4);

        // Missing records are never created by update
        let other = session("+14155552671", Utc::now());
        assert!(!store.update(&other, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_index() {
        let store = InMemorySessionStore::new();
        let s = session("jane@example.com", Utc::now());
        assert!(store.insert(&s, None).await.unwrap());
        store.delete(&s.id).await.unwrap();

        assert!(store.is_empty().await);
        assert!(store.find_by_identifier("jane@example.com").await.unwrap().is_none());
        // Deleting twice is fine
        store.delete(&s.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemorySessionStore::new();
        let dead = session("+97612345678", Utc::now() - Duration::hours(1));
        let live = session("+14155552671", Utc::now());
        assert!(store.insert(&dead, None).await.unwrap());
        assert!(store.insert(&live, None).await.unwrap());

        assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 1);
        assert!(store.find_by_identifier("+97612345678").await.unwrap().is_none());
        assert!(store.get(&live.id).await.unwrap().is_some());
    }
}
