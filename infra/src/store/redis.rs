//! Redis-backed session store
//!
//! Layout:
//! - `otp:session:{id}` - JSON record, TTL at the retention deadline
//! - `otp:identifier:{identifier}` - id of the identifier's current session
//!
//! Writes that depend on the stored state run as Lua scripts so they are
//! atomic across processes. Redis evicts records through their TTL, so
//! `purge_expired` has nothing to do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Script;
use uuid::Uuid;

use og_core::domain::entities::OtpSession;
use og_core::errors::DomainResult;
use og_core::services::verification::SessionStore;

use crate::cache::RedisClient;
use crate::InfrastructureError;

const SESSION_KEY_PREFIX: &str = "otp:session:";
const IDENTIFIER_KEY_PREFIX: &str = "otp:identifier:";

// KEYS: identifier index, new session key
// ARGV: new id, record, ttl, session key prefix, id the caller saw or ''
const INSERT_SCRIPT: &str = r#"
local previous = redis.call('GET', KEYS[1])
if previous and redis.call('EXISTS', ARGV[4] .. previous) == 0 then
    previous = false
end
if (previous or '') ~= ARGV[5] then
    return 0
end
if previous and previous ~= ARGV[1] then
    redis.call('DEL', ARGV[4] .. previous)
end
redis.call('SET', KEYS[2], ARGV[2], 'EX', ARGV[3])
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
return 1
"#;

// KEYS: session key, identifier index
// ARGV: expected version, record, ttl, id
const UPDATE_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
local decoded = cjson.decode(current)
if tonumber(decoded['version']) ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
if redis.call('GET', KEYS[2]) == ARGV[4] then
    redis.call('EXPIRE', KEYS[2], ARGV[3])
end
return 1
"#;

// KEYS: session key, identifier index
// ARGV: id
const DELETE_SCRIPT: &str = r#"
redis.call('DEL', KEYS[1])
if redis.call('GET', KEYS[2]) == ARGV[1] then
    redis.call('DEL', KEYS[2])
end
return 1
"#;

/// Session store shared by every process connected to the same Redis
pub struct RedisSessionStore {
    client: RedisClient,
    insert_script: Script,
    update_script: Script,
    delete_script: Script,
}

impl RedisSessionStore {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            insert_script: Script::new(INSERT_SCRIPT),
            update_script: Script::new(UPDATE_SCRIPT),
            delete_script: Script::new(DELETE_SCRIPT),
        }
    }

    fn session_key(&self, session_id: &Uuid) -> String {
        self.client.make_key(&format!("{}{}", SESSION_KEY_PREFIX, session_id))
    }

    fn identifier_key(&self, identifier: &str) -> String {
        self.client.make_key(&format!("{}{}", IDENTIFIER_KEY_PREFIX, identifier))
    }

    async fn load(&self, key: &str) -> Result<Option<OtpSession>, InfrastructureError> {
        match self.client.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// Seconds until the record may be evicted, at least one
fn ttl_seconds(session: &OtpSession, now: DateTime<Utc>) -> u64 {
    (session.retention_deadline() - now).num_seconds().max(1) as u64
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &Uuid) -> DomainResult<Option<OtpSession>> {
        Ok(self.load(&self.session_key(session_id)).await?)
    }

    async fn find_by_identifier(&self, identifier: &str) -> DomainResult<Option<OtpSession>> {
        let Some(raw_id) = self.client.get(&self.identifier_key(identifier)).await? else {
            return Ok(None);
        };

        match Uuid::parse_str(&raw_id) {
            Ok(id) => self.get(&id).await,
            Err(e) => {
                tracing::warn!(error = %e, event = "corrupt_identifier_index", "Ignoring unparsable session index");
                Ok(None)
            }
        }
    }

    async fn insert(&self, session: &OtpSession, replaces: Option<&Uuid>) -> DomainResult<bool> {
        let record = serde_json::to_string(session).map_err(InfrastructureError::from)?;
        let keys = [self.identifier_key(&session.identifier), self.session_key(&session.id)];
        let args = [
            session.id.to_string(),
            record,
            ttl_seconds(session, Utc::now()).to_string(),
            self.client.make_key(SESSION_KEY_PREFIX),
            replaces.map(Uuid::to_string).unwrap_or_default(),
        ];

        let written = self
            .client
            .run_script::<i64>(&self.insert_script, &keys, &args)
            .await?;
        Ok(written == 1)
    }

    async fn update(&self, session: &OtpSession, expected_version: u64) -> DomainResult<bool> {
        let record = serde_json::to_string(session).map_err(InfrastructureError::from)?;
        let keys = [self.session_key(&session.id), self.identifier_key(&session.identifier)];
        let args = [
            expected_version.to_string(),
            record,
            ttl_seconds(session, Utc::now()).to_string(),
            session.id.to_string(),
        ];

        let written = self
            .client
            .run_script::<i64>(&self.update_script, &keys, &args)
            .await?;
        Ok(written == 1)
    }

    async fn delete(&self, session_id: &Uuid) -> DomainResult<()> {
        let session_key = self.session_key(session_id);
        let Some(session) = self.load(&session_key).await? else {
            return Ok(());
        };

        let keys = [session_key, self.identifier_key(&session.identifier)];
        let args = [session_id.to_string()];
        self.client
            .run_script::<i64>(&self.delete_script, &keys, &args)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> DomainResult<usize> {
        Ok(0)
    }
}
