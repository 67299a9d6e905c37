use crate::error::app_error::AppError;
use crate::models::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Durable CRUD over session records keyed by the opaque session id.
///
/// Implementations may reclaim expired records on their own schedule; that
/// reclamation is best-effort only, and the logical `expires_at` check in
/// the lifecycle manager stays authoritative.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upserts the complete record.
    async fn put(&self, session: &Session) -> Result<(), AppError>;

    /// Returns the record, or `None` when the id is unknown. Never returns
    /// a partially populated record.
    async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError>;

    /// Idempotent; deleting an unknown id is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), AppError>;

    /// Partial update of `last_activity_at` only. Callers treat failures
    /// as log-and-discard.
    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// Redis-backed store. Each session is a hash under `session:{id}` with an
/// `EXPIREAT` set to the logical expiry, so the server reclaims dead
/// records even when no request ever observes them again.
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn key(session_id: &str) -> String {
        format!("session:{session_id}")
    }
}

fn hash_fields(session: &Session) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("user_id", session.user_id.to_string()),
        ("user_email", session.user_email.clone()),
        ("user_name", session.user_name.clone()),
        ("created_at", session.created_at.to_rfc3339()),
        ("expires_at", session.expires_at.to_rfc3339()),
        ("last_activity_at", session.last_activity_at.to_rfc3339()),
    ];
    if let Some(customer_id) = &session.stripe_customer_id {
        fields.push(("stripe_customer_id", customer_id.clone()));
    }
    fields
}

fn parse_timestamp(map: &HashMap<String, String>, field: &str) -> Option<DateTime<Utc>> {
    let raw = map.get(field)?;
    DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.with_timezone(&Utc))
}

fn session_from_hash(session_id: &str, map: &HashMap<String, String>) -> Option<Session> {
    Some(Session {
        id: session_id.to_owned(),
        user_id: Uuid::parse_str(map.get("user_id")?).ok()?,
        user_email: map.get("user_email")?.clone(),
        user_name: map.get("user_name")?.clone(),
        stripe_customer_id: map.get("stripe_customer_id").cloned(),
        created_at: parse_timestamp(map, "created_at")?,
        expires_at: parse_timestamp(map, "expires_at")?,
        last_activity_at: parse_timestamp(map, "last_activity_at")?,
    })
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session: &Session) -> Result<(), AppError> {
        let key = Self::key(&session.id);
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, &hash_fields(session))
            .ignore()
            .expire_at(&key, session.expires_at.timestamp())
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        let key = Self::key(session_id);
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = conn.hgetall(&key).await?;
        if map.is_empty() {
            return Ok(None);
        }

        match session_from_hash(session_id, &map) {
            Some(session) => Ok(Some(session)),
            None => {
                // A field-only hash left behind by a touch racing a delete.
                // Reclaim it and report the session absent.
                warn!(session_id = %session_id, "discarding unreadable session record");
                if let Err(err) = conn.del::<_, ()>(&key).await {
                    warn!(session_id = %session_id, error = ?err, "failed to reclaim unreadable session record");
                }
                Ok(None)
            }
        }
    }

    async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(session_id)).await?;
        Ok(())
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let key = Self::key(session_id);
        let mut conn = self.conn.clone();
        // HSET on a reclaimed key would resurrect it as a field-only hash
        // with no TTL, so only touch records that still exist.
        let exists: bool = conn.exists(&key).await?;
        if exists {
            let _: () = conn.hset(&key, "last_activity_at", at.to_rfc3339()).await?;
        }
        Ok(())
    }
}
