use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(url(message = "success_url must be a valid URL"))]
    pub success_url: Option<String>,
    #[validate(url(message = "cancel_url must be a valid URL"))]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PortalRequest {
    #[validate(url(message = "return_url must be a valid URL"))]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub is_pro: bool,
    pub status: Option<String>,
    pub subscription_id: Option<String>,
}

/// Redirect target returned by checkout and portal session creation.
#[derive(Debug, Serialize)]
pub struct BillingUrlResponse {
    pub url: String,
}
