use crate::error::app_error::AppError;
use crate::models::session::Session;
use crate::session::SessionManager;
use crate::session::cookie::{removal_cookie, session_id_from_jar};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

/// The validated session behind the current request.
///
/// Taking this as a route parameter marks the route protected: requests
/// without a valid session cookie never reach the handler.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentSession {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cookies = req.cookies();

        // Nothing presented: reject without a store lookup, and with
        // nothing to clear.
        let Some(session_id) = session_id_from_jar(cookies) else {
            return Outcome::Error((Status::Unauthorized, AppError::Unauthenticated));
        };

        let Some(manager) = req.rocket().state::<SessionManager>() else {
            return Outcome::Error((Status::InternalServerError, AppError::Unauthenticated));
        };

        match manager.validate(&session_id).await {
            Some(session) => {
                let current = CurrentSession(session);
                req.local_cache(|| Some(current.clone()));
                Outcome::Success(current)
            }
            None => {
                // The presented cookie is stale or invalid; clear it so the
                // client does not keep looping on the same credential.
                cookies.add(removal_cookie());
                Outcome::Error((Status::Unauthorized, AppError::Unauthenticated))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::IdentitySnapshot;
    use crate::session::cookie::SESSION_COOKIE_NAME;
    use crate::test_utils::MemorySessionStore;
    use rocket::http::Cookie;
    use rocket::local::asynchronous::Client;
    use rocket::{get, routes};
    use std::sync::Arc;
    use uuid::Uuid;

    #[get("/protected")]
    fn protected(session: CurrentSession) -> String {
        session.0.user_email
    }

    async fn client_with_store(store: Arc<MemorySessionStore>) -> Client {
        let rocket = rocket::build()
            .manage(SessionManager::new(store))
            .mount("/", routes![protected]);
        Client::untracked(rocket).await.expect("valid rocket instance")
    }

    fn snapshot() -> IdentitySnapshot {
        IdentitySnapshot {
            user_id: Uuid::new_v4(),
            user_email: "a@x.com".to_string(),
            user_name: "A".to_string(),
            stripe_customer_id: None,
        }
    }

    #[rocket::async_test]
    async fn missing_cookie_fails_closed_without_a_lookup() {
        let store = Arc::new(MemorySessionStore::default());
        let client = client_with_store(store.clone()).await;

        let response = client.get("/protected").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(store.get_calls(), 0);
    }

    #[rocket::async_test]
    async fn stale_cookie_is_rejected_and_cleared() {
        let store = Arc::new(MemorySessionStore::default());
        let client = client_with_store(store.clone()).await;

        let response = client
            .get("/protected")
            .cookie(Cookie::new(SESSION_COOKIE_NAME, "01STALE"))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(store.get_calls(), 1);

        let set_cookie: Vec<&str> = response.headers().get("Set-Cookie").collect();
        assert!(
            set_cookie
                .iter()
                .any(|header| header.starts_with(&format!("{SESSION_COOKIE_NAME}=;")) && header.contains("Max-Age=0")),
            "expected a clearing Set-Cookie header, got {set_cookie:?}"
        );
    }

    #[rocket::async_test]
    async fn valid_cookie_reaches_the_handler() {
        let store = Arc::new(MemorySessionStore::default());
        let manager = SessionManager::new(store.clone());
        let session = manager.create(snapshot()).await.unwrap();

        let client = client_with_store(store).await;
        let response = client
            .get("/protected")
            .cookie(Cookie::new(SESSION_COOKIE_NAME, session.id.clone()))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "a@x.com");
    }
}
