use crate::config::GoogleConfig;
use crate::error::app_error::AppError;
use serde::Deserialize;
use tracing::error;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const PROFILE_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Client for Google's authorization-code flow.
pub struct GoogleAuth {
    client: reqwest::Client,
    config: GoogleConfig,
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
}

/// Profile payload from the userinfo endpoint. Google sometimes returns
/// `id` instead of the OIDC `sub`, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: Option<String>,
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

impl GoogleProfile {
    /// Google's stable account identifier, from `sub` or the legacy `id`.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().or(self.id.as_deref())
    }
}

impl GoogleAuth {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// URL the browser is redirected to for consent.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&state={}&access_type=offline&prompt=select_account",
            AUTHORIZATION_ENDPOINT,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, AppError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|err| AppError::oauth(format!("token request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::oauth(format!("token exchange failed with status {status}")));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|err| AppError::oauth(format!("malformed token response: {err}")))
    }

    /// Fetches the profile behind an access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, AppError> {
        let response = self
            .client
            .get(PROFILE_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| AppError::oauth(format!("profile request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Google profile fetch failed");
            return Err(AppError::oauth(format!("profile fetch failed with status {status}")));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|err| AppError::oauth(format!("malformed profile response: {err}")))
    }
}
