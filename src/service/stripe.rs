use crate::error::app_error::AppError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::error;
use uuid::Uuid;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Client for the slice of Stripe's form-encoded v1 REST API this app
/// touches: customers, checkout sessions, the billing portal, and
/// subscription listing/cancellation.
pub struct StripeClient {
    client: reqwest::Client,
    api_key: String,
    price_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripePortalSession {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
}

/// Condensed subscription view consumed by the status endpoint.
#[derive(Debug)]
pub struct SubscriptionStatus {
    pub is_active: bool,
    pub subscription_id: Option<String>,
    pub status: Option<String>,
}

impl StripeClient {
    pub fn new(api_key: String, price_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            price_id,
        }
    }

    pub fn price_id(&self) -> Option<&str> {
        self.price_id.as_deref()
    }

    pub async fn create_customer(&self, email: &str, user_id: &Uuid) -> Result<StripeCustomer, AppError> {
        let user_id = user_id.to_string();
        self.post_form(
            "/customers",
            &[("email", email), ("metadata[user_id]", user_id.as_str())],
        )
        .await
    }

    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
        user_id: &Uuid,
    ) -> Result<StripeCheckoutSession, AppError> {
        let user_id = user_id.to_string();
        self.post_form(
            "/checkout/sessions",
            &[
                ("customer", customer_id),
                ("payment_method_types[0]", "card"),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", "1"),
                ("mode", "subscription"),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
                ("metadata[user_id]", user_id.as_str()),
            ],
        )
        .await
    }

    pub async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<StripePortalSession, AppError> {
        self.post_form(
            "/billing_portal/sessions",
            &[("customer", customer_id), ("return_url", return_url)],
        )
        .await
    }

    pub async fn list_subscriptions(&self, customer_id: &str, status: &str) -> Result<StripeList<StripeSubscription>, AppError> {
        let response = self
            .client
            .get(format!("{API_BASE}/subscriptions"))
            .bearer_auth(&self.api_key)
            .query(&[("customer", customer_id), ("status", status)])
            .send()
            .await
            .map_err(|err| AppError::Billing(format!("Stripe request failed: {err}")))?;

        Self::parse_response(response, "/subscriptions").await
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), AppError> {
        self.delete(&format!("/subscriptions/{subscription_id}")).await
    }

    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), AppError> {
        self.delete(&format!("/customers/{customer_id}")).await
    }

    /// Reports whether the customer holds an active or trialing
    /// subscription. Provider failures degrade to an inactive `unknown`
    /// status rather than erroring the request.
    pub async fn subscription_status(&self, customer_id: &str) -> SubscriptionStatus {
        match self.list_subscriptions(customer_id, "all").await {
            Ok(list) => summarize(&list.data),
            Err(err) => {
                error!(customer_id = %customer_id, error = ?err, "failed to check subscription status");
                SubscriptionStatus {
                    is_active: false,
                    subscription_id: None,
                    status: Some("unknown".to_string()),
                }
            }
        }
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, AppError> {
        let response = self
            .client
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(&self.api_key)
            .form(params)
            .send()
            .await
            .map_err(|err| AppError::Billing(format!("Stripe request failed: {err}")))?;

        Self::parse_response(response, path).await
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(format!("{API_BASE}{path}"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| AppError::Billing(format!("Stripe request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(path = %path, status = %status, body = %body, "Stripe API call failed");
            return Err(AppError::Billing(format!("Stripe returned status {status}")));
        }

        Ok(())
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(path = %path, status = %status, body = %body, "Stripe API call failed");
            return Err(AppError::Billing(format!("Stripe returned status {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Billing(format!("malformed Stripe response: {err}")))
    }
}

fn summarize(subscriptions: &[StripeSubscription]) -> SubscriptionStatus {
    if let Some(active) = subscriptions
        .iter()
        .find(|subscription| subscription.status == "active" || subscription.status == "trialing")
    {
        return SubscriptionStatus {
            is_active: true,
            subscription_id: Some(active.id.clone()),
            status: Some(active.status.clone()),
        };
    }

    SubscriptionStatus {
        is_active: false,
        subscription_id: None,
        status: subscriptions.first().map(|subscription| subscription.status.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_list(json: &str) -> StripeList<StripeSubscription> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn trialing_subscription_counts_as_active() {
        let list = parse_list(
            r#"{"object": "list", "data": [
                {"id": "sub_1", "status": "canceled"},
                {"id": "sub_2", "status": "trialing"}
            ]}"#,
        );
        let status = summarize(&list.data);
        assert!(status.is_active);
        assert_eq!(status.subscription_id.as_deref(), Some("sub_2"));
        assert_eq!(status.status.as_deref(), Some("trialing"));
    }

    #[test]
    fn cancelled_only_customer_is_not_pro() {
        let list = parse_list(r#"{"object": "list", "data": [{"id": "sub_1", "status": "canceled"}]}"#);
        let status = summarize(&list.data);
        assert!(!status.is_active);
        assert_eq!(status.subscription_id, None);
        assert_eq!(status.status.as_deref(), Some("canceled"));
    }

    #[test]
    fn empty_list_has_no_status() {
        let status = summarize(&[]);
        assert!(!status.is_active);
        assert_eq!(status.status, None);
    }
}
