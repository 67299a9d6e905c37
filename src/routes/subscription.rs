use crate::Config;
use crate::auth::CurrentSession;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::billing::{BillingUrlResponse, CheckoutRequest, PortalRequest, SubscriptionStatusResponse};
use crate::service::stripe::StripeClient;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use validator::Validate;

#[rocket::get("/subscription/status")]
pub async fn subscription_status(
    pool: &State<PgPool>,
    stripe: &State<Option<StripeClient>>,
    session: CurrentSession,
) -> Result<Json<SubscriptionStatusResponse>, AppError> {
    let Some(stripe) = stripe.inner().as_ref() else {
        return Ok(Json(SubscriptionStatusResponse {
            is_pro: false,
            status: Some("not_configured".to_string()),
            subscription_id: None,
        }));
    };

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.get_user_by_id(&session.0.user_id).await?.ok_or(AppError::UserNotFound)?;

    let Some(customer_id) = user.stripe_customer_id.as_deref() else {
        return Ok(Json(SubscriptionStatusResponse {
            is_pro: false,
            status: None,
            subscription_id: None,
        }));
    };

    let status = stripe.subscription_status(customer_id).await;
    Ok(Json(SubscriptionStatusResponse {
        is_pro: status.is_active,
        status: status.status,
        subscription_id: status.subscription_id,
    }))
}

#[rocket::post("/subscription/checkout", data = "<payload>")]
pub async fn create_checkout(
    pool: &State<PgPool>,
    stripe: &State<Option<StripeClient>>,
    config: &State<Config>,
    session: CurrentSession,
    payload: JsonBody<CheckoutRequest>,
) -> Result<Json<BillingUrlResponse>, AppError> {
    payload.validate()?;

    let Some(stripe) = stripe.inner().as_ref() else {
        return Err(AppError::BadRequest("Stripe is not configured".to_string()));
    };
    let Some(price_id) = stripe.price_id() else {
        return Err(AppError::BadRequest("Stripe is not configured".to_string()));
    };

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.get_user_by_id(&session.0.user_id).await?.ok_or(AppError::UserNotFound)?;

    // First checkout creates the Stripe customer and pins its id to the
    // user record.
    let customer_id = match user.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let customer = stripe.create_customer(&user.email, &user.id).await?;
            repo.set_stripe_customer_id(&user.id, &customer.id).await?;
            customer.id
        }
    };

    let success_url = payload
        .success_url
        .clone()
        .unwrap_or_else(|| format!("{}/dashboard?subscription=success", config.app.url));
    let cancel_url = payload
        .cancel_url
        .clone()
        .unwrap_or_else(|| format!("{}/dashboard?subscription=cancelled", config.app.url));

    let checkout = stripe
        .create_checkout_session(&customer_id, price_id, &success_url, &cancel_url, &user.id)
        .await?;

    Ok(Json(BillingUrlResponse { url: checkout.url }))
}

#[rocket::post("/subscription/portal", data = "<payload>")]
pub async fn create_portal(
    pool: &State<PgPool>,
    stripe: &State<Option<StripeClient>>,
    config: &State<Config>,
    session: CurrentSession,
    payload: JsonBody<PortalRequest>,
) -> Result<Json<BillingUrlResponse>, AppError> {
    payload.validate()?;

    let Some(stripe) = stripe.inner().as_ref() else {
        return Err(AppError::BadRequest("Stripe is not configured".to_string()));
    };

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.get_user_by_id(&session.0.user_id).await?.ok_or(AppError::UserNotFound)?;

    let Some(customer_id) = user.stripe_customer_id.as_deref() else {
        return Err(AppError::NotFound("No active subscription found".to_string()));
    };

    let return_url = payload
        .return_url
        .clone()
        .unwrap_or_else(|| format!("{}/dashboard", config.app.url));

    let portal = stripe.create_portal_session(customer_id, &return_url).await?;
    Ok(Json(BillingUrlResponse { url: portal.url }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![subscription_status, create_checkout, create_portal]
}
