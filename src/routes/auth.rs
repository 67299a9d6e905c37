use crate::Config;
use crate::auth::CurrentSession;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::SuccessResponse;
use crate::models::session::SnapshotUpdate;
use crate::models::user::UserResponse;
use crate::session::SessionManager;
use crate::session::cookie::{remaining_max_age, removal_cookie, session_cookie};
use chrono::Utc;
use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;

#[rocket::post("/auth/logout")]
pub async fn logout(
    manager: &State<SessionManager>,
    session: CurrentSession,
    cookies: &CookieJar<'_>,
) -> Json<SuccessResponse> {
    manager.destroy(&session.0.id).await;
    cookies.add(removal_cookie());

    Json(SuccessResponse {
        success: true,
        message: None,
    })
}

/// Re-reads the user record and folds the fresh identity snapshot into the
/// session, sliding its expiry window. The cookie is re-issued so the
/// browser-side Max-Age follows the server-side window.
#[rocket::post("/auth/refresh")]
pub async fn refresh(
    pool: &State<PgPool>,
    manager: &State<SessionManager>,
    config: &State<Config>,
    session: CurrentSession,
    cookies: &CookieJar<'_>,
) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.get_user_by_id(&session.0.user_id).await?.ok_or(AppError::UserNotFound)?;

    let updates = SnapshotUpdate {
        user_email: Some(user.email.clone()),
        user_name: Some(user.name.clone()),
        stripe_customer_id: user.stripe_customer_id.clone(),
    };
    let refreshed = manager.refresh(&session.0.id, updates).await.ok_or(AppError::SessionRefresh)?;

    let max_age = remaining_max_age(refreshed.expires_at, Utc::now());
    cookies.add(session_cookie(&refreshed.id, max_age, config.app.production));

    Ok(Json(UserResponse::from(&user)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![logout, refresh]
}
