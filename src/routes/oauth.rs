use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::session::IdentitySnapshot;
use crate::models::user::NewUser;
use crate::service::google::GoogleAuth;
use crate::session::cookie::session_cookie;
use crate::session::{SESSION_DURATION_SECS, SessionManager};
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket::time::Duration;
use rocket::{State, routes};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

/// Short-lived cookie holding the OAuth state between redirect and callback.
const STATE_COOKIE_NAME: &str = "oauth_state";
const STATE_COOKIE_MAX_AGE_SECS: i64 = 5 * 60;

#[rocket::get("/google")]
pub fn google_redirect(google: &State<GoogleAuth>, cookies: &CookieJar<'_>) -> Redirect {
    let state = Uuid::new_v4().to_string();

    cookies.add(
        Cookie::build((STATE_COOKIE_NAME, state.clone()))
            .path("/oauth")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(STATE_COOKIE_MAX_AGE_SECS))
            .build(),
    );

    Redirect::to(google.authorization_url(&state))
}

#[rocket::get("/google/callback?<code>&<state>")]
pub async fn google_callback(
    pool: &State<PgPool>,
    google: &State<GoogleAuth>,
    manager: &State<SessionManager>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
    code: Option<&str>,
    state: Option<&str>,
) -> Result<Redirect, AppError> {
    let Some(code) = code.filter(|code| !code.is_empty()) else {
        return Err(AppError::BadRequest("Authorization code is required".to_string()));
    };

    let expected_state = cookies.get(STATE_COOKIE_NAME).map(|cookie| cookie.value().to_string());
    cookies.remove(Cookie::build(STATE_COOKIE_NAME).path("/oauth").build());
    if expected_state.is_none() || expected_state.as_deref() != state {
        return Err(AppError::BadRequest("OAuth state mismatch".to_string()));
    }

    let token = google.exchange_code(code).await?;
    let profile = google.fetch_profile(&token.access_token).await?;
    let subject = profile
        .subject()
        .ok_or_else(|| AppError::oauth("profile has no subject identifier"))?
        .to_owned();

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = match repo.get_user_by_email(&profile.email).await? {
        Some(user) => user,
        None => {
            repo.create_user(&NewUser {
                email: profile.email.clone(),
                google_id: subject,
                name: profile.name.clone(),
                given_name: profile.given_name.clone(),
                family_name: profile.family_name.clone(),
                profile_picture: profile.picture.clone(),
            })
            .await?
        }
    };

    let session = manager.create(IdentitySnapshot::from(&user)).await.inspect_err(|err| {
        error!(user_id = %user.id, error = ?err, "failed to create session after OAuth exchange");
    })?;

    cookies.add(session_cookie(&session.id, SESSION_DURATION_SECS, config.app.production));

    Ok(Redirect::to("/dashboard"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![google_redirect, google_callback]
}
