use crate::auth::CurrentSession;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::SuccessResponse;
use crate::service::account::delete_user_account;
use crate::service::files::FileStore;
use crate::service::stripe::StripeClient;
use crate::session::SessionManager;
use crate::session::cookie::removal_cookie;
use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[rocket::delete("/account")]
pub async fn delete_account(
    pool: &State<PgPool>,
    stripe: &State<Option<StripeClient>>,
    files: &State<Arc<dyn FileStore>>,
    manager: &State<SessionManager>,
    session: CurrentSession,
    cookies: &CookieJar<'_>,
) -> Result<Json<SuccessResponse>, AppError> {
    info!(user_id = %session.0.user_id, "account deletion requested");

    let repo = PostgresRepository { pool: pool.inner().clone() };
    delete_user_account(&repo, stripe.inner().as_ref(), files.inner().as_ref(), &session.0.user_id).await?;

    manager.destroy(&session.0.id).await;
    cookies.add(removal_cookie());

    Ok(Json(SuccessResponse {
        success: true,
        message: Some("Account and all associated data have been permanently deleted".to_string()),
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![delete_account]
}
