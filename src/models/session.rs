use crate::models::user::User;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Server-side session record. The id doubles as the cookie value and as
/// the primary key in the session store.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// Identity fields captured on the session at creation and refresh time,
/// denormalized so that request handling does not need a directory lookup.
#[derive(Debug, Clone)]
pub struct IdentitySnapshot {
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub stripe_customer_id: Option<String>,
}

impl From<&User> for IdentitySnapshot {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            user_email: user.email.clone(),
            user_name: user.name.clone(),
            stripe_customer_id: user.stripe_customer_id.clone(),
        }
    }
}

/// Partial snapshot merge applied by a refresh. `user_id` and `created_at`
/// are not refreshable.
#[derive(Debug, Default, Clone)]
pub struct SnapshotUpdate {
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub stripe_customer_id: Option<String>,
}
