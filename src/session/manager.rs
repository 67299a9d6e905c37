use crate::error::app_error::AppError;
use crate::models::session::{IdentitySnapshot, Session, SnapshotUpdate};
use crate::session::SESSION_DURATION_SECS;
use crate::session::store::SessionStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Owns the session lifecycle: issue, validate, refresh, revoke.
///
/// The store handle is injected at construction so tests can substitute an
/// in-memory fake.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Issues a new session for an authenticated identity.
    ///
    /// Callers must not set a session cookie when this fails.
    pub async fn create(&self, snapshot: IdentitySnapshot) -> Result<Session, AppError> {
        let now = Utc::now();
        let session = Session {
            // UUIDv7 ids are time-ordered, so store keys sort by issue time.
            id: Uuid::now_v7().to_string(),
            user_id: snapshot.user_id,
            user_email: snapshot.user_email,
            user_name: snapshot.user_name,
            stripe_customer_id: snapshot.stripe_customer_id,
            created_at: now,
            expires_at: now + Duration::seconds(SESSION_DURATION_SECS),
            last_activity_at: now,
        };
        self.store.put(&session).await?;
        Ok(session)
    }

    /// Resolves a session id to its record, or `None` for anything that
    /// must be treated as unauthenticated: empty or unknown ids, expired
    /// records, store failures (fail-closed).
    ///
    /// A successful read dispatches a detached activity touch; the touch
    /// never delays or fails the request that triggered it.
    pub async fn validate(&self, session_id: &str) -> Option<Session> {
        if session_id.is_empty() {
            return None;
        }

        let session = match self.store.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(err) => {
                warn!(session_id = %session_id, error = ?err, "session lookup failed, treating as absent");
                return None;
            }
        };

        let now = Utc::now();
        if now > session.expires_at {
            // Logically dead even while physically present; reclaim it
            // without making the request wait.
            self.spawn_delete(session_id);
            return None;
        }

        self.spawn_touch(session_id, now);
        Some(session)
    }

    /// Re-validates, merges the snapshot updates, and slides the expiry
    /// window. Read-modify-write without a concurrency token: concurrent
    /// refreshes race and the last write wins.
    pub async fn refresh(&self, session_id: &str, updates: SnapshotUpdate) -> Option<Session> {
        let mut session = self.validate(session_id).await?;

        let now = Utc::now();
        if let Some(email) = updates.user_email {
            session.user_email = email;
        }
        if let Some(name) = updates.user_name {
            session.user_name = name;
        }
        if let Some(customer_id) = updates.stripe_customer_id {
            session.stripe_customer_id = Some(customer_id);
        }
        session.expires_at = now + Duration::seconds(SESSION_DURATION_SECS);
        session.last_activity_at = now;

        match self.store.put(&session).await {
            Ok(()) => Some(session),
            Err(err) => {
                warn!(session_id = %session_id, error = ?err, "failed to write refreshed session");
                None
            }
        }
    }

    /// Unconditional, idempotent revocation. Store failures are logged and
    /// swallowed: the caller is clearing the cookie either way.
    pub async fn destroy(&self, session_id: &str) {
        if session_id.is_empty() {
            return;
        }
        if let Err(err) = self.store.delete(session_id).await {
            warn!(session_id = %session_id, error = ?err, "failed to delete session");
        }
    }

    fn spawn_delete(&self, session_id: &str) {
        let store = Arc::clone(&self.store);
        let session_id = session_id.to_owned();
        tokio::spawn(async move {
            if let Err(err) = store.delete(&session_id).await {
                warn!(session_id = %session_id, error = ?err, "deferred session delete failed");
            }
        });
    }

    fn spawn_touch(&self, session_id: &str, at: DateTime<Utc>) {
        let store = Arc::clone(&self.store);
        let session_id = session_id.to_owned();
        tokio::spawn(async move {
            if let Err(err) = store.touch(&session_id, at).await {
                warn!(session_id = %session_id, error = ?err, "activity touch failed");
            }
        });
    }
}
