use crate::auth::CurrentSession;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::user::{UpdateProfileRequest, UserResponse};
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use validator::Validate;

#[rocket::get("/me")]
pub async fn get_me(pool: &State<PgPool>, session: CurrentSession) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };

    // A valid session whose user vanished from the directory is a distinct
    // failure from an invalid session.
    let user = repo.get_user_by_id(&session.0.user_id).await?.ok_or(AppError::UserNotFound)?;

    Ok(Json(UserResponse::from(&user)))
}

#[rocket::patch("/me", data = "<payload>")]
pub async fn patch_me(
    pool: &State<PgPool>,
    session: CurrentSession,
    payload: JsonBody<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.update_profile(&session.0.user_id, &payload).await?;

    Ok(Json(UserResponse::from(&user)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![get_me, patch_me]
}
