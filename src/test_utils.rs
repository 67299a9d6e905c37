use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::session::Session;
use crate::models::user::{NewUser, UpdateProfileRequest, User};
use crate::service::files::FileStore;
use crate::session::store::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// In-memory session store with call counters, so tests can observe
/// store-level traffic.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    get_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    touch_calls: AtomicUsize,
}

impl MemorySessionStore {
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn touch_calls(&self) -> usize {
        self.touch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session: &Session) -> Result<(), AppError> {
        self.sessions.lock().unwrap().insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<(), AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        self.touch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(session) = self.sessions.lock().unwrap().get_mut(session_id) {
            session.last_activity_at = at;
        }
        Ok(())
    }
}

/// Store whose every operation fails, for fail-closed tests.
pub struct FailingSessionStore;

fn outage() -> AppError {
    AppError::from(redis::RedisError::from((redis::ErrorKind::Io, "simulated outage")))
}

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn put(&self, _session: &Session) -> Result<(), AppError> {
        Err(outage())
    }

    async fn get(&self, _session_id: &str) -> Result<Option<Session>, AppError> {
        Err(outage())
    }

    async fn delete(&self, _session_id: &str) -> Result<(), AppError> {
        Err(outage())
    }

    async fn touch(&self, _session_id: &str, _at: DateTime<Utc>) -> Result<(), AppError> {
        Err(outage())
    }
}

/// Polls a condition while yielding to the runtime, for asserting on
/// detached background tasks.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn sample_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: "a@x.com".to_string(),
        google_id: "google-sub-1".to_string(),
        name: "A".to_string(),
        given_name: None,
        family_name: None,
        profile_picture: None,
        stripe_customer_id: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct MockRepository {
    pub users: Mutex<HashMap<Uuid, User>>,
}

impl MockRepository {
    pub fn with_user(user: User) -> Self {
        let repo = Self::default();
        repo.users.lock().unwrap().insert(user.id, user);
        repo
    }
}

#[async_trait]
impl UserRepository for MockRepository {
    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            google_id: new_user.google_id.clone(),
            name: new_user.name.clone(),
            given_name: new_user.given_name.clone(),
            family_name: new_user.family_name.clone(),
            profile_picture: new_user.profile_picture.clone(),
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_profile(&self, id: &Uuid, update: &UpdateProfileRequest) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or(AppError::NotFound("Resource not found".to_string()))?;
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(given_name) = &update.given_name {
            user.given_name = Some(given_name.clone());
        }
        if let Some(family_name) = &update.family_name {
            user.family_name = Some(family_name.clone());
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_stripe_customer_id(&self, id: &Uuid, customer_id: &str) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().unwrap().get_mut(id) {
            user.stripe_customer_id = Some(customer_id.to_string());
        }
        Ok(())
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError> {
        self.users.lock().unwrap().remove(id);
        Ok(())
    }
}

/// File store recording deletions instead of performing them.
#[derive(Default)]
pub struct MemoryFileStore {
    pub deleted_prefixes: Mutex<Vec<String>>,
    fail: bool,
}

impl MemoryFileStore {
    pub fn failing() -> Self {
        Self {
            deleted_prefixes: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn delete_user_files(&self, user_id: &Uuid) -> Result<usize, AppError> {
        if self.fail {
            return Err(AppError::object_storage("simulated outage"));
        }
        self.deleted_prefixes.lock().unwrap().push(format!("users/{user_id}/"));
        Ok(2)
    }
}
